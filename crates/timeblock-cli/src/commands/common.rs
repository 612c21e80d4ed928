//! Shared plumbing for the command modules: one `Session` per invocation.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use timeblock_core::{
    clock, Config, CredentialProvider, GoogleAuth, GoogleCalendarClient, GoogleTasksClient,
    Session,
};

pub type GoogleSession = Session<GoogleTasksClient, GoogleCalendarClient>;

/// Build a session from config. One process is one session.
pub fn open_session(config: &Config) -> Result<GoogleSession, Box<dyn std::error::Error>> {
    let tz = config.tz()?;
    let auth: Arc<dyn CredentialProvider> = Arc::new(GoogleAuth::new(config.oauth_redirect_port));
    let task_store = GoogleTasksClient::new(auth.clone());
    let event_store = GoogleCalendarClient::new(auth.clone(), config.calendar_id.clone());
    Ok(Session::new(
        auth,
        task_store,
        event_store,
        tz,
        config.routines_list.clone(),
        config.default_duration_min,
    ))
}

/// Build a session and load the task snapshot.
pub fn open_loaded_session(config: &Config) -> Result<GoogleSession, Box<dyn std::error::Error>> {
    let mut session = open_session(config)?;
    session.connect()?;
    session.load()?;
    Ok(session)
}

/// Parse a user-supplied start time: RFC 3339, or a naive
/// `YYYY-MM-DDTHH:MM[:SS]` interpreted in the reference timezone.
pub fn parse_start(text: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(clock::attach_zone(naive, tz));
        }
    }
    Err(format!(
        "cannot parse '{text}' as a start time (expected YYYY-MM-DDTHH:MM)"
    ))
}
