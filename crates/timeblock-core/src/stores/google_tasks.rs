//! Google Tasks client.
//!
//! Blocking HTTP adapter over the Tasks v1 API. Listings page through
//! `nextPageToken` (100 items per page); mutations are single PATCH/POST/
//! DELETE calls. The base URL is injectable for tests.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::auth::CredentialProvider;
use crate::error::StoreError;

use super::{check_status, decode_json, RawTask, TaskDraft, TaskList, TaskStore};

pub const DEFAULT_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";

const PAGE_SIZE: &str = "100";

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

pub struct GoogleTasksClient {
    http: Client,
    base_url: String,
    auth: Arc<dyn CredentialProvider>,
}

impl GoogleTasksClient {
    pub fn new(auth: Arc<dyn CredentialProvider>) -> Self {
        Self::with_base_url(auth, DEFAULT_BASE_URL)
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(auth: Arc<dyn CredentialProvider>, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }

    fn token(&self) -> Result<String, StoreError> {
        Ok(self.auth.credential(false)?.access_token)
    }

    fn list_pages<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        base_query: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let token = self.token()?;
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = base_query.to_vec();
            query.push(("maxResults", PAGE_SIZE));
            if let Some(page_token) = page_token.as_deref() {
                query.push(("pageToken", page_token));
            }

            let resp = self
                .http
                .get(url)
                .query(&query)
                .bearer_auth(&token)
                .send()
                .map_err(|source| StoreError::Http { operation, source })?;
            let page: Page<T> = decode_json(operation, check_status(operation, resp)?)?;

            items.extend(page.items);
            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => return Ok(items),
            }
        }
    }
}

impl TaskStore for GoogleTasksClient {
    fn list_tasklists(&self) -> Result<Vec<TaskList>, StoreError> {
        self.list_pages("tasks.tasklists.list", &format!("{}/users/@me/lists", self.base_url), &[])
    }

    fn list_open_tasks(&self, list_id: &str) -> Result<Vec<RawTask>, StoreError> {
        let url = format!("{}/lists/{}/tasks", self.base_url, urlencoding::encode(list_id));
        self.list_pages(
            "tasks.list",
            &url,
            &[("showCompleted", "false"), ("showHidden", "false")],
        )
    }

    fn complete_task(&self, list_id: &str, task_id: &str) -> Result<(), StoreError> {
        const OP: &str = "tasks.complete";
        let url = format!(
            "{}/lists/{}/tasks/{}",
            self.base_url,
            urlencoding::encode(list_id),
            urlencoding::encode(task_id)
        );
        let body = json!({
            "status": "completed",
            "completed": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .map_err(|source| StoreError::Http { operation: OP, source })?;
        check_status(OP, resp)?;
        Ok(())
    }

    fn set_due(
        &self,
        list_id: &str,
        task_id: &str,
        due: DateTime<Utc>,
    ) -> Result<RawTask, StoreError> {
        const OP: &str = "tasks.set_due";
        let url = format!(
            "{}/lists/{}/tasks/{}",
            self.base_url,
            urlencoding::encode(list_id),
            urlencoding::encode(task_id)
        );
        let body = json!({
            "due": due.to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .map_err(|source| StoreError::Http { operation: OP, source })?;
        decode_json(OP, check_status(OP, resp)?)
    }

    fn insert_task(&self, list_id: &str, draft: &TaskDraft) -> Result<RawTask, StoreError> {
        const OP: &str = "tasks.insert";
        let url = format!("{}/lists/{}/tasks", self.base_url, urlencoding::encode(list_id));
        let mut body = json!({ "title": draft.title });
        if let Some(notes) = &draft.notes {
            body["notes"] = json!(notes);
        }
        if let Some(due) = draft.due {
            body["due"] = json!(due.to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()
            .map_err(|source| StoreError::Http { operation: OP, source })?;
        decode_json(OP, check_status(OP, resp)?)
    }

    fn delete_task(&self, list_id: &str, task_id: &str) -> Result<(), StoreError> {
        const OP: &str = "tasks.delete";
        let url = format!(
            "{}/lists/{}/tasks/{}",
            self.base_url,
            urlencoding::encode(list_id),
            urlencoding::encode(task_id)
        );
        let resp = self
            .http
            .delete(&url)
            .bearer_auth(self.token()?)
            .send()
            .map_err(|source| StoreError::Http { operation: OP, source })?;
        check_status(OP, resp)?;
        Ok(())
    }
}
