use crate::error::{LeadflowError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A credential that never appears in `Debug` output or serialized config.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NotionConfig {
    #[serde(skip)]
    pub api_key: Secret,
    pub database_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HunterConfig {
    #[serde(skip)]
    pub api_key: Secret,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiConfig {
    #[serde(skip)]
    pub api_key: Secret,
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailConfig {
    pub address: String,
    #[serde(skip)]
    pub password: Secret,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub imap_server: String,
    pub imap_port: u16,
    pub sender_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowConfig {
    pub stakeholder_email: String,
    pub trigger_subject: String,
    pub require_trigger: bool,
    pub outreach_subject: String,
    pub concurrency: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub call_timeout: Duration,
    #[serde(serialize_with = "serialize_secs")]
    pub cycle_interval: Duration,
}

impl WorkflowConfig {
    /// IMAP search criteria for trigger messages.
    pub fn trigger_criteria(&self) -> String {
        format!(
            "UNSEEN SUBJECT \"{}\"",
            self.trigger_subject.replace('"', "")
        )
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Immutable process configuration, read once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub notion: NotionConfig,
    pub hunter: HunterConfig,
    pub openai: OpenAiConfig,
    pub mail: MailConfig,
    pub workflow: WorkflowConfig,
}

pub const REQUIRED_KEYS: &[&str] = &[
    "NOTION_API_KEY",
    "NOTION_DATABASE_ID",
    "HUNTER_API_KEY",
    "OPENAI_API_KEY",
    "SMTP_EMAIL",
    "SMTP_PASSWORD",
    "SMTP_SERVER",
    "STAKEHOLDER_EMAIL",
];

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    ///
    /// Every missing required key is reported in a single `ConfigMissing`.
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| get(k).is_none())
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LeadflowError::ConfigMissing(missing));
        }
        let required = |key: &str| get(key).unwrap_or_default();
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let concurrency: usize = parse_or(&get, "OUTREACH_CONCURRENCY", 4)?;
        let timeout_secs: u64 = parse_or(&get, "ADAPTER_TIMEOUT_SECS", 30)?;
        let interval_minutes: u64 = parse_or(&get, "CYCLE_INTERVAL_MINUTES", 30)?;
        for (key, value) in [
            ("OUTREACH_CONCURRENCY", concurrency as u64),
            ("ADAPTER_TIMEOUT_SECS", timeout_secs),
            ("CYCLE_INTERVAL_MINUTES", interval_minutes),
        ] {
            if value == 0 {
                return Err(LeadflowError::ConfigInvalid {
                    key: key.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        let call_timeout = bounded_secs("ADAPTER_TIMEOUT_SECS", timeout_secs, 1)?;
        let cycle_interval = bounded_secs("CYCLE_INTERVAL_MINUTES", interval_minutes, 60)?;

        Ok(Self {
            notion: NotionConfig {
                api_key: Secret::new(required("NOTION_API_KEY")),
                database_id: required("NOTION_DATABASE_ID"),
                api_base: trim_base(or("NOTION_API_BASE", "https://api.notion.com")),
            },
            hunter: HunterConfig {
                api_key: Secret::new(required("HUNTER_API_KEY")),
                api_base: trim_base(or("HUNTER_API_BASE", "https://api.hunter.io")),
            },
            openai: OpenAiConfig {
                api_key: Secret::new(required("OPENAI_API_KEY")),
                model: or("OPENAI_MODEL", "gpt-4"),
                api_base: trim_base(or("OPENAI_API_BASE", "https://api.openai.com")),
                max_tokens: 150,
                temperature: 0.7,
            },
            mail: MailConfig {
                address: required("SMTP_EMAIL"),
                password: Secret::new(required("SMTP_PASSWORD")),
                smtp_server: required("SMTP_SERVER"),
                smtp_port: parse_or(&get, "SMTP_PORT", 587)?,
                imap_server: or("IMAP_SERVER", "imap.gmail.com"),
                imap_port: parse_or(&get, "IMAP_PORT", 993)?,
                sender_name: or("SENDER_NAME", "Lead Outreach"),
            },
            workflow: WorkflowConfig {
                stakeholder_email: required("STAKEHOLDER_EMAIL"),
                trigger_subject: or("TRIGGER_SUBJECT", "New Campaign Task"),
                require_trigger: parse_bool_or(&get, "REQUIRE_TRIGGER", false)?,
                outreach_subject: or("OUTREACH_SUBJECT", "A quick introduction"),
                concurrency,
                call_timeout,
                cycle_interval,
            },
        })
    }
}

/// Longest accepted interval or timeout.
pub const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// `value` units of `unit_secs` each, capped at [`MAX_DURATION`].
fn bounded_secs(key: &str, value: u64, unit_secs: u64) -> Result<Duration> {
    value
        .checked_mul(unit_secs)
        .filter(|secs| *secs <= MAX_DURATION.as_secs())
        .map(Duration::from_secs)
        .ok_or_else(|| LeadflowError::ConfigInvalid {
            key: key.into(),
            reason: format!("'{value}' exceeds the one-week maximum"),
        })
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| LeadflowError::ConfigInvalid {
            key: key.into(),
            reason: format!("'{raw}': {e}"),
        }),
    }
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(LeadflowError::ConfigInvalid {
                key: key.into(),
                reason: format!("'{v}' is not a boolean"),
            }),
        },
    }
}
