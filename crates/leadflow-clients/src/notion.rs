//! Lead store backed by a Notion database.
//!
//! # Property layout
//!
//! ```text
//! Email            email
//! Name             title
//! Company          rich_text
//! Industry         rich_text | select
//! Email Verified   select     (empty → unknown, "Yes" → valid, "No" → invalid)
//! Response Status  select     ("Pending", "Interested", "Not Interested", "No Response")
//! Notes            rich_text
//! ```

use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::adapters::LeadStore;
use leadflow_core::config::NotionConfig;
use leadflow_core::types::{Lead, LeadUpdate, ResponseStatus, VerificationStatus};
use leadflow_core::{LeadflowError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::{check_status, client, request_error};

const ADAPTER: &str = "notion";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion caps a single rich-text content string at 2000 characters.
const RICH_TEXT_CHUNK: usize = 2000;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// NotionStore
// ---------------------------------------------------------------------------

pub struct NotionStore {
    http: reqwest::Client,
    config: NotionConfig,
    timeout: Duration,
}

impl NotionStore {
    pub fn new(config: NotionConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: client(ADAPTER, timeout)?,
            config,
            timeout,
        })
    }

    /// Run a database query, following pagination to the end.
    async fn query(&self, filter: Value) -> Result<Vec<Page>> {
        let url = format!(
            "{}/v1/databases/{}/query",
            self.config.api_base, self.config.database_id
        );
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "filter": filter, "page_size": 100 });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }
            let resp = self
                .http
                .post(&url)
                .bearer_auth(self.config.api_key.expose())
                .header("Notion-Version", NOTION_VERSION)
                .json(&body)
                .send()
                .await
                .map_err(|e| request_error(ADAPTER, self.timeout, e))?;
            let page: QueryResponse = check_status(ADAPTER, resp)
                .await?
                .json()
                .await
                .map_err(|e| request_error(ADAPTER, self.timeout, e))?;

            pages.extend(page.results);

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(pages)
    }
}

#[async_trait]
impl LeadStore for NotionStore {
    async fn fetch_actionable(&self) -> Result<Vec<Lead>> {
        let pages = self.query(actionable_filter()).await?;
        Ok(pages
            .iter()
            .filter_map(|p| match page_to_lead(p) {
                Ok(lead) => Some(lead),
                Err(reason) => {
                    tracing::warn!(page = %p.id, reason = %reason, "lead record skipped");
                    None
                }
            })
            .collect())
    }

    /// Records carrying a Response Status label outside the known set are
    /// refused rather than read as Pending.
    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>> {
        let pages = self
            .query(json!({ "property": "Email", "email": { "equals": email } }))
            .await?;
        pages
            .first()
            .map(|p| {
                page_to_lead(p).map_err(|reason| LeadflowError::bad_response(ADAPTER, reason))
            })
            .transpose()
    }

    async fn update(&self, key: &str, update: &LeadUpdate) -> Result<()> {
        let url = format!("{}/v1/pages/{}", self.config.api_base, key);
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(self.config.api_key.expose())
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "properties": update_properties(update) }))
            .send()
            .await
            .map_err(|e| request_error(ADAPTER, self.timeout, e))?;
        check_status(ADAPTER, resp).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Property mapping
// ---------------------------------------------------------------------------

/// Records still needing verification or awaiting a reply.
fn actionable_filter() -> Value {
    json!({
        "or": [
            { "property": "Email Verified", "select": { "is_empty": true } },
            { "property": "Response Status", "select": { "is_empty": true } },
            { "property": "Response Status", "select": { "equals": "Pending" } }
        ]
    })
}

fn page_to_lead(page: &Page) -> std::result::Result<Lead, String> {
    let props = &page.properties;
    let email = props.get("Email").map(plain_text).unwrap_or_default();
    if email.is_empty() {
        return Err("no email".into());
    }
    let text = |name: &str| props.get(name).map(plain_text).unwrap_or_default();
    let response = text("Response Status");
    let response_status = response_from_label(&response)
        .ok_or_else(|| format!("unrecognised Response Status label '{response}'"))?;

    Ok(Lead {
        key: page.id.clone(),
        email,
        name: text("Name"),
        company: text("Company"),
        industry: text("Industry"),
        verification_status: verification_from_label(&text("Email Verified")),
        response_status,
        notes: text("Notes"),
    })
}

/// Flatten any text-like property value to a plain string.
fn plain_text(prop: &Value) -> String {
    let kind = prop.get("type").and_then(Value::as_str).unwrap_or_default();
    let value = match kind {
        "title" | "rich_text" => prop
            .get(kind)
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default(),
        "select" | "status" => prop
            .get(kind)
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        "email" | "phone_number" | "url" => prop
            .get(kind)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };
    value.trim().to_string()
}

fn verification_from_label(label: &str) -> VerificationStatus {
    match label.to_ascii_lowercase().as_str() {
        "yes" | "valid" => VerificationStatus::Valid,
        "no" | "invalid" => VerificationStatus::Invalid,
        _ => VerificationStatus::Unknown,
    }
}

fn verification_label(status: VerificationStatus) -> Option<&'static str> {
    match status {
        VerificationStatus::Valid => Some("Yes"),
        VerificationStatus::Invalid => Some("No"),
        VerificationStatus::Unknown => None,
    }
}

/// An empty label is Pending; an unknown one is `None`.
fn response_from_label(label: &str) -> Option<ResponseStatus> {
    match label.to_ascii_lowercase().as_str() {
        "" | "pending" => Some(ResponseStatus::Pending),
        "interested" => Some(ResponseStatus::Interested),
        "not interested" => Some(ResponseStatus::NotInterested),
        "no response" => Some(ResponseStatus::NoResponse),
        _ => None,
    }
}

fn response_label(status: ResponseStatus) -> &'static str {
    match status {
        ResponseStatus::Pending => "Pending",
        ResponseStatus::Interested => "Interested",
        ResponseStatus::NotInterested => "Not Interested",
        ResponseStatus::NoResponse => "No Response",
    }
}

fn update_properties(update: &LeadUpdate) -> Value {
    let mut props = Map::new();
    if let Some(status) = update.verification_status {
        let select = match verification_label(status) {
            Some(name) => json!({ "name": name }),
            None => Value::Null,
        };
        props.insert("Email Verified".into(), json!({ "select": select }));
    }
    if let Some(status) = update.response_status {
        props.insert(
            "Response Status".into(),
            json!({ "select": { "name": response_label(status) } }),
        );
    }
    if let Some(notes) = &update.notes {
        props.insert("Notes".into(), json!({ "rich_text": rich_text(notes) }));
    }
    Value::Object(props)
}

fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(RICH_TEXT_CHUNK)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}
