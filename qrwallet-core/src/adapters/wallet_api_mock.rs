//! Mock wallet API server for testing
//!
//! Simulates the portal endpoints used by the top-up flow:
//! - POST /api/QRs/ReadQr/{code} returns { errorCode, errorMessage? }
//! - GET /api/Wallet/GetWalletBalance returns { errorCode, data }
//! - GET /api/Users/GetUserInfo returns { errorCode, data: { phoneNumber } }
//!
//! Accepted codes can be redeemed once; a second attempt is rejected like the
//! real backend does.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value as JsonValue};

/// Mock wallet server for testing
pub struct MockWalletServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub lang: Option<String>,
}

/// Scripted backend behaviour
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Codes (as they appear in the URL path) the server accepts once
    pub valid_codes: Vec<String>,
    /// `data` of the balance endpoint
    pub balance: JsonValue,
    /// `errorCode` of the balance endpoint
    pub balance_error_code: i64,
    /// Answer the balance endpoint with a non-JSON body
    pub malformed_balance: bool,
    pub phone_number: Option<String>,
    /// Bearer token the server insists on, if any
    pub required_token: Option<String>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            valid_codes: vec!["ABC123".to_string()],
            balance: json!(150.50),
            balance_error_code: 0,
            malformed_balance: false,
            phone_number: Some("01012345678".to_string()),
            required_token: None,
            delay_ms: 0,
        }
    }
}

struct ServerState {
    config: MockConfig,
    redeemed: Mutex<HashSet<String>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockWalletServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = Arc::new(ServerState {
            config,
            redeemed: Mutex::new(HashSet::new()),
            requests: requests.clone(),
        });

        // Non-blocking so the accept loop can notice shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let state = state.clone();
                        thread::spawn(move || handle_connection(stream, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    /// Base URL to hand to the client, including the `/api` prefix
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api", self.port)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockWalletServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn header_value(request: &str, name: &str) -> Option<String> {
    request.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

fn handle_connection(mut stream: TcpStream, state: &ServerState) {
    // The listener is non-blocking; accepted sockets must block
    let _ = stream.set_nonblocking(false);
    let mut buffer = [0; 4096];

    let Ok(n) = stream.read(&mut buffer) else {
        return;
    };
    let request = String::from_utf8_lossy(&buffer[..n]);
    let config = &state.config;

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let first_line = request.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    }
    let (method, path) = (parts[0], parts[1]);

    let authorization = header_value(&request, "authorization");
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            authorization: authorization.clone(),
            lang: header_value(&request, "lang"),
        });
    }

    if let Some(token) = &config.required_token {
        if authorization.as_deref() != Some(format!("Bearer {}", token).as_str()) {
            let body = json!({"errorCode": 401, "errorMessage": "Unauthorized"});
            send_response(&mut stream, 401, "Unauthorized", &body.to_string());
            return;
        }
    }

    let path_without_query = path.split('?').next().unwrap_or(path);

    match (method, path_without_query) {
        ("POST", p) if p.starts_with("/api/QRs/ReadQr/") => {
            let code = &p["/api/QRs/ReadQr/".len()..];
            let body = redeem(state, code);
            send_response(&mut stream, 200, "OK", &body.to_string());
        }
        ("GET", "/api/Wallet/GetWalletBalance") => {
            if config.malformed_balance {
                send_response(&mut stream, 502, "Bad Gateway", "<html>upstream error</html>");
                return;
            }
            let message = if config.balance_error_code == 0 {
                JsonValue::Null
            } else {
                json!("balance unavailable")
            };
            let body = json!({
                "errorCode": config.balance_error_code,
                "errorMessage": message,
                "data": config.balance,
            });
            send_response(&mut stream, 200, "OK", &body.to_string());
        }
        ("GET", "/api/Users/GetUserInfo") => {
            let body = json!({
                "errorCode": 0,
                "data": { "phoneNumber": config.phone_number },
            });
            send_response(&mut stream, 200, "OK", &body.to_string());
        }
        _ => {
            send_response(
                &mut stream,
                404,
                "Not Found",
                r#"{"error": "Endpoint not found"}"#,
            );
        }
    }
}

fn redeem(state: &ServerState, code: &str) -> JsonValue {
    if !state.config.valid_codes.iter().any(|c| c == code) {
        return json!({"errorCode": 5, "errorMessage": "كود غير صالح"});
    }
    let Ok(mut redeemed) = state.redeemed.lock() else {
        return json!({"errorCode": 500, "errorMessage": "server error"});
    };
    if !redeemed.insert(code.to_string()) {
        return json!({"errorCode": 6, "errorMessage": "الكود مستخدم من قبل"});
    }
    json!({"errorCode": 0, "errorMessage": null})
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::adapters::http_wallet::{HttpWalletBackend, DEFAULT_TIMEOUT};
    use crate::domain::result::Error;
    use crate::ports::WalletBackend;

    fn client(server: &MockWalletServer) -> HttpWalletBackend {
        HttpWalletBackend::new(&server.base_url(), "student-token", "ar", DEFAULT_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn test_redeem_valid_code_once() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let backend = client(&server);

        let first = backend.redeem("ABC123").await.unwrap();
        assert!(first.is_success());

        let second = backend.redeem("ABC123").await.unwrap();
        assert_eq!(second.error_code, 6);
    }

    #[tokio::test]
    async fn test_redeem_invalid_code_carries_server_message() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let env = client(&server).redeem("BAD").await.unwrap();

        assert_eq!(env.error_code, 5);
        assert_eq!(env.error_message.as_deref(), Some("كود غير صالح"));
    }

    #[tokio::test]
    async fn test_requests_carry_token_and_lang() {
        let server = MockWalletServer::start(MockConfig {
            required_token: Some("student-token".to_string()),
            ..Default::default()
        })
        .unwrap();
        let backend = client(&server);

        let env = backend.get_balance().await.unwrap();
        assert!(env.is_success());
        assert_eq!(env.data, Some(json!(150.5)));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer student-token"));
        assert_eq!(requests[0].lang.as_deref(), Some("ar"));
    }

    #[tokio::test]
    async fn test_redeem_posts_encoded_code() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        client(&server).redeem("A/B").await.unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/QRs/ReadQr/A%2FB");
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_error() {
        let server = MockWalletServer::start(MockConfig {
            malformed_balance: true,
            ..Default::default()
        })
        .unwrap();

        let err = client(&server).get_balance().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_user_info() {
        let server = MockWalletServer::start(MockConfig::default()).unwrap();
        let env = client(&server).get_user_info().await.unwrap();
        assert_eq!(
            env.data.and_then(|d| d.phone_number).as_deref(),
            Some("01012345678")
        );
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockWalletServer::start(MockConfig {
            delay_ms: 500,
            ..Default::default()
        })
        .unwrap();
        let backend = HttpWalletBackend::new(
            &server.base_url(),
            "t",
            "ar",
            Duration::from_millis(100),
        )
        .unwrap();

        let err = backend.get_balance().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let mut server = MockWalletServer::start(MockConfig::default()).unwrap();
        let backend = client(&server);
        server.stop();
        drop(server);

        // Listener is gone once the accept thread exits
        let err = backend.get_balance().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
