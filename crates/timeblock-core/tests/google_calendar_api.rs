//! Wire-level tests for the Google Calendar client against a local mock
//! server.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use mockito::Matcher;
use timeblock_core::auth::{Credential, CredentialProvider};
use timeblock_core::{CredentialError, EventDraft, EventStore, GoogleCalendarClient, StoreError};

struct StaticToken;

impl CredentialProvider for StaticToken {
    fn credential(&self, _force_reauth: bool) -> Result<Credential, CredentialError> {
        Ok(Credential {
            access_token: "test-token".into(),
            expires_at: None,
        })
    }

    fn clear(&self) -> Result<(), CredentialError> {
        Ok(())
    }
}

fn draft() -> EventDraft {
    EventDraft {
        summary: "Write report".into(),
        description: "From timeblock list: Work".into(),
        start: Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 1, 8, 8, 30, 0).unwrap(),
        timezone: "Europe/Madrid".parse::<Tz>().unwrap(),
        suppress_notifications: true,
    }
}

#[test]
fn insert_posts_event_with_zone_and_suppressed_notifications() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/calendars/primary/events")
        .match_query(Matcher::UrlEncoded("sendUpdates".into(), "none".into()))
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "summary": "Write report",
            "description": "From timeblock list: Work",
            "start": {
                "dateTime": "2024-01-08T09:00:00+01:00",
                "timeZone": "Europe/Madrid"
            },
            "end": {
                "dateTime": "2024-01-08T09:30:00+01:00",
                "timeZone": "Europe/Madrid"
            }
        })))
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"ev-1","status":"confirmed","htmlLink":"https://cal/ev-1"}"#)
        .expect(1)
        .create();

    let client = GoogleCalendarClient::with_base_url(Arc::new(StaticToken), "primary", server.url());
    let event = client.insert_event(&draft()).unwrap();
    assert_eq!(event.id, "ev-1");
    assert_eq!(event.html_link.as_deref(), Some("https://cal/ev-1"));
    mock.assert();
}

#[test]
fn calendar_id_is_escaped_into_the_path() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/calendars/team%40example.com/events")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"ev-2"}"#)
        .expect(1)
        .create();

    let client =
        GoogleCalendarClient::with_base_url(Arc::new(StaticToken), "team@example.com", server.url());
    client.insert_event(&draft()).unwrap();
    mock.assert();
}

#[test]
fn api_errors_carry_operation_and_message() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/calendars/primary/events")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#)
        .create();

    let client = GoogleCalendarClient::with_base_url(Arc::new(StaticToken), "primary", server.url());
    let err = client.insert_event(&draft()).unwrap_err();
    match err {
        StoreError::Api {
            operation,
            status,
            message,
        } => {
            assert_eq!(operation, "events.insert");
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid Credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}
