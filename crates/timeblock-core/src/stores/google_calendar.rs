//! Google Calendar client.
//!
//! One operation: insert an event into the configured calendar. Attendee
//! notifications are suppressed explicitly via `sendUpdates` on every call.

use std::sync::Arc;

use reqwest::blocking::Client;
use serde_json::json;

use crate::auth::CredentialProvider;
use crate::error::StoreError;
use crate::scheduling::EventDraft;

use super::{check_status, decode_json, EventRecord, EventStore};

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarClient {
    http: Client,
    base_url: String,
    calendar_id: String,
    auth: Arc<dyn CredentialProvider>,
}

impl GoogleCalendarClient {
    pub fn new(auth: Arc<dyn CredentialProvider>, calendar_id: impl Into<String>) -> Self {
        Self::with_base_url(auth, calendar_id, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(
        auth: Arc<dyn CredentialProvider>,
        calendar_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            calendar_id: calendar_id.into(),
            auth,
        }
    }
}

impl EventStore for GoogleCalendarClient {
    fn insert_event(&self, draft: &EventDraft) -> Result<EventRecord, StoreError> {
        const OP: &str = "events.insert";
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&self.calendar_id)
        );
        let tz_name = draft.timezone.name();
        let body = json!({
            "summary": draft.summary,
            "description": draft.description,
            "start": {
                "dateTime": draft.start.with_timezone(&draft.timezone).to_rfc3339(),
                "timeZone": tz_name,
            },
            "end": {
                "dateTime": draft.end.with_timezone(&draft.timezone).to_rfc3339(),
                "timeZone": tz_name,
            },
        });
        let send_updates = if draft.suppress_notifications {
            "none"
        } else {
            "all"
        };

        let token = self.auth.credential(false)?.access_token;
        let resp = self
            .http
            .post(&url)
            .query(&[("sendUpdates", send_updates)])
            .bearer_auth(token)
            .json(&body)
            .send()
            .map_err(|source| StoreError::Http { operation: OP, source })?;
        decode_json(OP, check_status(OP, resp)?)
    }
}
