//! Setup command - configure the wallet API

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Input;
use qrwallet_core::adapters::http_wallet::HttpWalletBackend;
use qrwallet_core::config::Config;

use super::{get_wallet_dir, is_interactive};

pub fn run(
    api_url: Option<String>,
    lang: Option<String>,
    timeout: Option<u64>,
    frame_interval: Option<u64>,
) -> Result<()> {
    let wallet_dir = get_wallet_dir()?;
    let mut config = Config::load(&wallet_dir)?;

    let nothing_given =
        api_url.is_none() && lang.is_none() && timeout.is_none() && frame_interval.is_none();

    let (api_url, lang, timeout) = if nothing_given && is_interactive() {
        let url: String = Input::new()
            .with_prompt("API base URL")
            .with_initial_text(config.api_base_url.clone())
            .interact_text()?;
        let lang: String = Input::new()
            .with_prompt("Language")
            .with_initial_text(config.lang.clone())
            .interact_text()?;
        let timeout: u64 = Input::new()
            .with_prompt("Request timeout (seconds)")
            .default(config.request_timeout.as_secs())
            .interact_text()?;
        (Some(url), Some(lang), Some(timeout))
    } else {
        (api_url, lang, timeout)
    };

    if let Some(secs) = timeout {
        if secs == 0 {
            anyhow::bail!("Timeout must be at least one second");
        }
        config.set_request_timeout(secs);
    }
    if let Some(lang) = lang {
        config.set_lang(lang.trim());
    }
    if let Some(url) = api_url {
        // Reject URLs the client could not use
        HttpWalletBackend::new(url.trim(), "", &config.lang, config.request_timeout)
            .context("Invalid API URL")?;
        config.set_api_base_url(url.trim());
    }
    if let Some(ms) = frame_interval {
        if ms == 0 {
            anyhow::bail!("Frame interval must be at least one millisecond");
        }
        config.set_frame_interval(ms);
    }

    config.save(&wallet_dir)?;

    println!("{} Settings saved", "Success!".green());
    println!("  API: {}", config.api_base_url);
    println!("  Language: {}", config.lang);
    println!("  Timeout: {}s", config.request_timeout.as_secs());
    println!("  Frame interval: {}ms", config.frame_interval.as_millis());
    Ok(())
}
