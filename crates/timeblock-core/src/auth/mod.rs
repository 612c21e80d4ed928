//! Credential Provider: Google OAuth with tokens cached in the OS keyring.
//!
//! The engine only sees the [`CredentialProvider`] trait; the production
//! implementation is [`GoogleAuth`]. Client id/secret are provisioned once
//! via the CLI and live in the keyring next to the tokens; they are never
//! written to the config file.

pub mod oauth;

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::error::CredentialError;
use oauth::{OAuthConfig, OAuthTokens};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/tasks",
    "https://www.googleapis.com/auth/calendar.events",
];

const KEY_CLIENT_ID: &str = "google_client_id";
const KEY_CLIENT_SECRET: &str = "google_client_secret";
const KEY_TOKENS: &str = "google_tokens";

/// An opaque credential usable as a bearer token.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Supplies credentials to stores and the session.
pub trait CredentialProvider {
    /// Return a usable credential. `force_reauth` restarts the interactive
    /// flow even when a cached token exists.
    fn credential(&self, force_reauth: bool) -> Result<Credential, CredentialError>;

    /// Invalidate any cached credential.
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    use crate::error::CredentialError;

    const SERVICE: &str = "timeblock";

    pub fn get(key: &str) -> Result<Option<String>, CredentialError> {
        let entry =
            keyring::Entry::new(SERVICE, key).map_err(|e| CredentialError::Keyring(e.to_string()))?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Keyring(e.to_string())),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), CredentialError> {
        let entry =
            keyring::Entry::new(SERVICE, key).map_err(|e| CredentialError::Keyring(e.to_string()))?;
        entry
            .set_password(value)
            .map_err(|e| CredentialError::Keyring(e.to_string()))
    }

    pub fn delete(key: &str) -> Result<(), CredentialError> {
        let entry =
            keyring::Entry::new(SERVICE, key).map_err(|e| CredentialError::Keyring(e.to_string()))?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Keyring(e.to_string())),
        }
    }
}

/// Google OAuth credential provider backed by the OS keyring.
pub struct GoogleAuth {
    redirect_port: u16,
}

impl GoogleAuth {
    pub fn new(redirect_port: u16) -> Self {
        Self { redirect_port }
    }

    /// Persist OAuth client credentials.
    pub fn set_client_credentials(client_id: &str, client_secret: &str) -> Result<(), CredentialError> {
        keyring_store::set(KEY_CLIENT_ID, client_id)?;
        keyring_store::set(KEY_CLIENT_SECRET, client_secret)?;
        Ok(())
    }

    /// Whether a cached token exists (expired or not).
    pub fn has_cached_tokens() -> bool {
        matches!(keyring_store::get(KEY_TOKENS), Ok(Some(_)))
    }

    fn oauth_config(&self) -> Result<OAuthConfig, CredentialError> {
        let client_id =
            keyring_store::get(KEY_CLIENT_ID)?.ok_or(CredentialError::ClientNotConfigured)?;
        let client_secret =
            keyring_store::get(KEY_CLIENT_SECRET)?.ok_or(CredentialError::ClientNotConfigured)?;
        Ok(OAuthConfig {
            client_id,
            client_secret,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            redirect_port: self.redirect_port,
        })
    }

    fn load_tokens() -> Result<Option<OAuthTokens>, CredentialError> {
        match keyring_store::get(KEY_TOKENS)? {
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                CredentialError::Keyring(format!("stored tokens are unreadable: {e}"))
            }),
            None => Ok(None),
        }
    }

    fn store_tokens(tokens: &OAuthTokens) -> Result<(), CredentialError> {
        let json = serde_json::to_string(tokens)
            .map_err(|e| CredentialError::Keyring(e.to_string()))?;
        keyring_store::set(KEY_TOKENS, &json)
    }

    fn browser_flow(&self) -> Result<OAuthTokens, CredentialError> {
        let config = self.oauth_config()?;
        let tokens = oauth::authorize(&config)?;
        Self::store_tokens(&tokens)?;
        Ok(tokens)
    }
}

fn credential_from(tokens: &OAuthTokens) -> Credential {
    Credential {
        access_token: tokens.access_token.clone(),
        expires_at: tokens
            .expires_at
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
    }
}

impl CredentialProvider for GoogleAuth {
    fn credential(&self, force_reauth: bool) -> Result<Credential, CredentialError> {
        if force_reauth {
            return self.browser_flow().map(|t| credential_from(&t));
        }

        let tokens = Self::load_tokens()?.ok_or(CredentialError::NotAuthenticated)?;
        if !oauth::is_expired(&tokens) {
            return Ok(credential_from(&tokens));
        }

        if let Some(refresh) = tokens.refresh_token.as_deref() {
            let config = self.oauth_config()?;
            match oauth::refresh_token(&config, refresh) {
                Ok(refreshed) => {
                    Self::store_tokens(&refreshed)?;
                    return Ok(credential_from(&refreshed));
                }
                Err(e) => warn!("token refresh failed, falling back to browser flow: {e}"),
            }
        }

        self.browser_flow().map(|t| credential_from(&t))
    }

    fn clear(&self) -> Result<(), CredentialError> {
        keyring_store::delete(KEY_TOKENS)
    }
}
