use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeadflowError {
    #[error("{adapter} call timed out after {secs}s")]
    AdapterTimeout { adapter: &'static str, secs: u64 },

    #[error("{0} rejected the configured credentials")]
    AdapterAuthFailure(&'static str),

    #[error("{adapter} returned an unusable response: {detail}")]
    AdapterBadResponse {
        adapter: &'static str,
        detail: String,
    },

    #[error("{adapter} transport error: {detail}")]
    AdapterTransport {
        adapter: &'static str,
        detail: String,
    },

    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigMissing(Vec<String>),

    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("lead not found: {0}")]
    LeadNotFound(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LeadflowError {
    pub fn bad_response(adapter: &'static str, detail: impl Into<String>) -> Self {
        Self::AdapterBadResponse {
            adapter,
            detail: detail.into(),
        }
    }

    pub fn transport(adapter: &'static str, detail: impl Into<String>) -> Self {
        Self::AdapterTransport {
            adapter,
            detail: detail.into(),
        }
    }

    /// True for errors raised by an external service call, as opposed to
    /// local configuration or model violations.
    pub fn is_adapter_error(&self) -> bool {
        matches!(
            self,
            Self::AdapterTimeout { .. }
                | Self::AdapterAuthFailure(_)
                | Self::AdapterBadResponse { .. }
                | Self::AdapterTransport { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LeadflowError>;
