//! Configuration management
//!
//! Settings live in `settings.json` in the wallet directory:
//! ```json
//! {
//!   "api": { "baseUrl": "https://eng-mohamedkhalf.shop/api", "lang": "ar", "timeoutSecs": 30 },
//!   "scanner": { "frameIntervalMs": 100 }
//! }
//! ```
//! Keys this crate does not know about are kept when saving.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::adapters::http_wallet::{API_URL_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::services::scanner::DEFAULT_FRAME_INTERVAL;

/// Environment variable to override the `lang` header
pub const LANG_ENV: &str = "QRWALLET_LANG";

pub const DEFAULT_LANG: &str = "ar";

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    api: ApiSettings,
    #[serde(default)]
    scanner: ScannerSettings,
    #[serde(flatten)]
    other: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(flatten)]
    other: Map<String, JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScannerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_interval_ms: Option<u64>,
    #[serde(flatten)]
    other: Map<String, JsonValue>,
}

/// Effective configuration: file values, then environment overrides
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub lang: String,
    pub request_timeout: Duration,
    pub frame_interval: Duration,
    // Raw file contents, so saving does not bake in env overrides
    raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(SettingsFile::default(), |_| None)
    }
}

impl Config {
    /// Load config from the wallet directory, applying env overrides
    pub fn load(wallet_dir: &Path) -> Result<Self> {
        Self::load_with_env(wallet_dir, |key| std::env::var(key).ok())
    }

    /// Load with an explicit environment lookup
    pub fn load_with_env(wallet_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self::resolve(Self::read_settings(wallet_dir)?, env))
    }

    fn read_settings(wallet_dir: &Path) -> Result<SettingsFile> {
        let settings_path = wallet_dir.join(SETTINGS_FILE);
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(&settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        // A hand-edited file that no longer parses falls back to defaults
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }

    fn resolve(raw: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |v: String| (!v.trim().is_empty()).then(|| v.trim().to_string());

        let api_base_url = env(API_URL_ENV)
            .and_then(non_empty)
            .or_else(|| raw.api.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let lang = env(LANG_ENV)
            .and_then(non_empty)
            .or_else(|| raw.api.lang.clone())
            .unwrap_or_else(|| DEFAULT_LANG.to_string());
        let request_timeout = raw
            .api
            .timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        let frame_interval = raw
            .scanner
            .frame_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FRAME_INTERVAL);

        Self {
            api_base_url,
            lang,
            request_timeout,
            frame_interval,
            raw_settings: raw,
        }
    }

    /// Save config to the wallet directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, wallet_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(wallet_dir)?;

        let mut settings = Self::read_settings(wallet_dir)?;
        settings.api.base_url = self.raw_settings.api.base_url.clone();
        settings.api.lang = self.raw_settings.api.lang.clone();
        settings.api.timeout_secs = self.raw_settings.api.timeout_secs;
        settings.scanner.frame_interval_ms = self.raw_settings.scanner.frame_interval_ms;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(wallet_dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }

    pub fn set_api_base_url(&mut self, url: &str) {
        self.api_base_url = url.to_string();
        self.raw_settings.api.base_url = Some(url.to_string());
    }

    pub fn set_lang(&mut self, lang: &str) {
        self.lang = lang.to_string();
        self.raw_settings.api.lang = Some(lang.to_string());
    }

    pub fn set_request_timeout(&mut self, secs: u64) {
        self.request_timeout = Duration::from_secs(secs);
        self.raw_settings.api.timeout_secs = Some(secs);
    }

    pub fn set_frame_interval(&mut self, ms: u64) {
        self.frame_interval = Duration::from_millis(ms);
        self.raw_settings.scanner.frame_interval_ms = Some(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_with_env(dir.path(), no_env).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.lang, "ar");
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.frame_interval, DEFAULT_FRAME_INTERVAL);
    }

    #[test]
    fn test_reads_file_values() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"api":{"baseUrl":"http://localhost:5000/api","lang":"en","timeoutSecs":5},
                "scanner":{"frameIntervalMs":250}}"#,
        )
        .unwrap();

        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:5000/api");
        assert_eq!(config.lang, "en");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.frame_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_env_overrides_file_but_is_not_saved() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"api":{"baseUrl":"http://file/api"}}"#,
        )
        .unwrap();

        let env = |key: &str| (key == API_URL_ENV).then(|| "http://env/api".to_string());
        let config = Config::load_with_env(dir.path(), env).unwrap();
        assert_eq!(config.api_base_url, "http://env/api");

        config.save(dir.path()).unwrap();
        let reloaded = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(reloaded.api_base_url, "http://file/api");
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"theme":"dark","api":{"retries":2}}"#,
        )
        .unwrap();

        let mut config = Config::load_with_env(dir.path(), no_env).unwrap();
        config.set_lang("en");
        config.set_request_timeout(10);
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap();
        let json: JsonValue = serde_json::from_str(&content).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["api"]["retries"], 2);
        assert_eq!(json["api"]["lang"], "en");
        assert_eq!(json["api"]["timeoutSecs"], 10);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();

        let config = Config::load_with_env(dir.path(), no_env).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
    }
}
