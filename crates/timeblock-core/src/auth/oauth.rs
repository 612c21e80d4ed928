//! OAuth2 Authorization Code flow for an installed app.
//!
//! 1. Opens the system browser to the consent URL (with a CSRF `state`)
//! 2. Receives the callback on a loopback TCP listener
//! 3. Exchanges the code for an access token (+ refresh token)
//!
//! Token persistence is the caller's concern (see [`super::keyring_store`]).

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use rand::{distributions::Alphanumeric, Rng};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// How long to wait for the browser callback.
pub const CALLBACK_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix timestamp.
    pub expires_at: Option<i64>,
    pub token_type: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub redirect_port: u16,
}

impl OAuthConfig {
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/callback", self.redirect_port)
    }

    pub fn auth_url_full(&self, state: &str) -> String {
        let scopes = self.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri()),
            urlencoding::encode(&scopes),
            urlencoding::encode(state),
        )
    }
}

/// Run the full flow: open browser, wait for the callback, exchange the code.
pub fn authorize(config: &OAuthConfig) -> Result<OAuthTokens, CredentialError> {
    let state = generate_state();

    let listener = TcpListener::bind(("127.0.0.1", config.redirect_port))
        .map_err(|e| CredentialError::AuthorizationFailed(format!("cannot bind callback port: {e}")))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| CredentialError::AuthorizationFailed(e.to_string()))?;

    let auth_url = config.auth_url_full(&state);
    open::that(&auth_url)
        .map_err(|e| CredentialError::AuthorizationFailed(format!("cannot open browser: {e}")))?;

    let code = wait_for_callback(&listener, &state, Duration::from_secs(CALLBACK_TIMEOUT_SECS))?;
    exchange_code(config, &code)
}

/// Wait for the browser redirect, verifying path, method, and `state`.
fn wait_for_callback(
    listener: &TcpListener,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, CredentialError> {
    let deadline = Instant::now() + timeout;

    loop {
        if Instant::now() >= deadline {
            return Err(CredentialError::CallbackTimeout {
                timeout_secs: timeout.as_secs(),
            });
        }

        match listener.accept() {
            Ok((mut stream, _addr)) => {
                let mut buf = [0u8; 8192];
                let size = stream
                    .read(&mut buf)
                    .map_err(|e| CredentialError::InvalidCallback(e.to_string()))?;
                if size == 0 {
                    continue;
                }

                let req = String::from_utf8_lossy(&buf[..size]);
                let first_line = req.lines().next().unwrap_or_default();
                let mut parts = first_line.split_whitespace();
                let method = parts.next().unwrap_or_default();
                let target = parts.next().unwrap_or_default();

                if method != "GET" {
                    respond(&mut stream, "405 Method Not Allowed", "Only GET is supported.");
                    continue;
                }

                let parsed = url::Url::parse(&format!("http://localhost{target}"))
                    .map_err(|e| CredentialError::InvalidCallback(e.to_string()))?;
                if parsed.path() != "/callback" {
                    respond(&mut stream, "404 Not Found", "Callback endpoint not found.");
                    continue;
                }

                let mut code = None;
                let mut state = None;
                let mut error = None;
                for (key, value) in parsed.query_pairs() {
                    match key.as_ref() {
                        "code" => code = Some(value.into_owned()),
                        "state" => state = Some(value.into_owned()),
                        "error" => error = Some(value.into_owned()),
                        _ => {}
                    }
                }

                if let Some(error) = error {
                    respond(&mut stream, "400 Bad Request", "Authorization was canceled.");
                    return Err(CredentialError::AuthorizationFailed(error));
                }
                if state.as_deref() != Some(expected_state) {
                    respond(&mut stream, "400 Bad Request", "State mismatch. Please retry.");
                    return Err(CredentialError::InvalidCallback(
                        "state mismatch".to_string(),
                    ));
                }
                let code = match code {
                    Some(code) => code,
                    None => {
                        respond(&mut stream, "400 Bad Request", "Missing authorization code.");
                        return Err(CredentialError::InvalidCallback(
                            "missing code".to_string(),
                        ));
                    }
                };

                respond(
                    &mut stream,
                    "200 OK",
                    "Authentication succeeded. You can close this tab.",
                );
                return Ok(code);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(e) => return Err(CredentialError::InvalidCallback(e.to_string())),
        }
    }
}

fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!("<html><body><h2>timeblock</h2><p>{message}</p></body></html>");
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    // Best effort; the browser closing early is not an error we act on.
    let _ = stream.write_all(response.as_bytes());
}

/// Exchange an authorization code for tokens.
pub fn exchange_code(config: &OAuthConfig, code: &str) -> Result<OAuthTokens, CredentialError> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", &config.redirect_uri()),
    ];
    let body = post_form(&config.token_url, &params)
        .map_err(CredentialError::TokenExchangeFailed)?;
    tokens_from_body(&body, None).map_err(CredentialError::TokenExchangeFailed)
}

/// Refresh an access token using the refresh token. The previous refresh
/// token is kept when the response omits one.
pub fn refresh_token(config: &OAuthConfig, refresh: &str) -> Result<OAuthTokens, CredentialError> {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("refresh_token", refresh),
        ("grant_type", "refresh_token"),
    ];
    let body = post_form(&config.token_url, &params)
        .map_err(CredentialError::TokenRefreshFailed)?;
    tokens_from_body(&body, Some(refresh)).map_err(CredentialError::TokenRefreshFailed)
}

fn post_form(url: &str, params: &[(&str, &str)]) -> Result<serde_json::Value, String> {
    let resp = Client::new()
        .post(url)
        .form(params)
        .send()
        .map_err(|e| e.to_string())?;
    resp.json().map_err(|e| e.to_string())
}

fn tokens_from_body(
    body: &serde_json::Value,
    previous_refresh: Option<&str>,
) -> Result<OAuthTokens, String> {
    if let Some(error) = body.get("error") {
        let detail = body
            .get("error_description")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(detail);
    }

    let access_token = body
        .get("access_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "response carries no access_token".to_string())?
        .to_string();
    let expires_at = body
        .get("expires_in")
        .and_then(|v| v.as_i64())
        .map(|secs| chrono::Utc::now().timestamp() + secs);

    Ok(OAuthTokens {
        access_token,
        refresh_token: body
            .get("refresh_token")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| previous_refresh.map(String::from)),
        expires_at,
        token_type: body
            .get("token_type")
            .and_then(|v| v.as_str())
            .unwrap_or("Bearer")
            .to_string(),
        scope: body.get("scope").and_then(|v| v.as_str()).map(String::from),
    })
}

/// Whether the token is expired or about to be (60 s buffer).
pub fn is_expired(tokens: &OAuthTokens) -> bool {
    match tokens.expires_at {
        Some(exp) => chrono::Utc::now().timestamp() > exp - 60,
        None => false,
    }
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token_url: "https://oauth2.googleapis.com/token".into(),
            scopes: vec![
                "https://www.googleapis.com/auth/tasks".into(),
                "https://www.googleapis.com/auth/calendar.events".into(),
            ],
            redirect_port: 7391,
        }
    }

    #[test]
    fn auth_url_carries_scopes_state_and_offline_access() {
        let url = config().auth_url_full("st4te");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?client_id=cid&"));
        assert!(url.contains("state=st4te"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains(&urlencoding::encode(
            "https://www.googleapis.com/auth/tasks https://www.googleapis.com/auth/calendar.events"
        ).into_owned()));
        assert!(url.contains(&urlencoding::encode("http://localhost:7391/callback").into_owned()));
    }

    #[test]
    fn token_body_parsing() {
        let body = serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "token_type": "Bearer",
            "scope": "a b"
        });
        let tokens = tokens_from_body(&body, None).unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
        assert!(tokens.expires_at.is_some());
    }

    #[test]
    fn refresh_response_without_refresh_token_keeps_the_old_one() {
        let body = serde_json::json!({ "access_token": "at2", "expires_in": 3600 });
        let tokens = tokens_from_body(&body, Some("old-rt")).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-rt"));
    }

    #[test]
    fn error_bodies_are_reported() {
        let body = serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been revoked."
        });
        assert_eq!(
            tokens_from_body(&body, None).unwrap_err(),
            "Token has been revoked."
        );
    }

    #[test]
    fn expiry_uses_a_buffer() {
        let soon = OAuthTokens {
            access_token: "at".into(),
            refresh_token: None,
            expires_at: Some(chrono::Utc::now().timestamp() + 30),
            token_type: "Bearer".into(),
            scope: None,
        };
        assert!(is_expired(&soon));

        let later = OAuthTokens {
            expires_at: Some(chrono::Utc::now().timestamp() + 3600),
            ..soon.clone()
        };
        assert!(!is_expired(&later));

        let no_expiry = OAuthTokens {
            expires_at: None,
            ..soon
        };
        assert!(!is_expired(&no_expiry));
    }

    fn callback_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn callback_accepts_matching_state_and_extracts_the_code() {
        let (listener, port) = callback_listener();
        let browser = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream
                .write_all(
                    b"GET /callback?code=abc123&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n",
                )
                .unwrap();
            let mut response = String::new();
            let _ = stream.read_to_string(&mut response);
            response
        });

        let code = wait_for_callback(&listener, "xyz", Duration::from_secs(5)).unwrap();
        assert_eq!(code, "abc123");
        let response = browser.join().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
    }

    #[test]
    fn callback_rejects_state_mismatch() {
        let (listener, port) = callback_listener();
        let browser = std::thread::spawn(move || {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
            stream
                .write_all(b"GET /callback?code=abc&state=wrong HTTP/1.1\r\n\r\n")
                .unwrap();
            let mut response = String::new();
            let _ = stream.read_to_string(&mut response);
        });

        let err = wait_for_callback(&listener, "expected", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCallback(_)));
        browser.join().unwrap();
    }

    #[test]
    fn callback_times_out_without_a_connection() {
        let (listener, _port) = callback_listener();
        let err = wait_for_callback(&listener, "s", Duration::from_millis(0)).unwrap_err();
        assert!(matches!(err, CredentialError::CallbackTimeout { .. }));
    }

    #[test]
    fn generated_state_is_alphanumeric() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
