use crate::output::print_json;
use anyhow::{bail, Context};
use leadflow_clients::NotionStore;
use leadflow_core::adapters::LeadStore;
use leadflow_core::types::ResponseStatus;
use leadflow_core::LeadflowError;
use serde_json::json;
use std::path::Path;

pub fn run(env_file: Option<&Path>, email: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let status = parse_terminal(status)?;
    let config = super::load_config(env_file)?;
    let store = NotionStore::new(config.notion.clone(), config.workflow.call_timeout)?;

    super::runtime()?.block_on(async {
        let lead = store
            .find_by_email(email)
            .await
            .context("failed to look up lead")?
            .ok_or_else(|| LeadflowError::LeadNotFound(email.to_string()))?;
        let update = lead.response_update(status, chrono::Utc::now())?;
        store
            .update(&lead.key, &update)
            .await
            .with_context(|| format!("failed to update {email}"))?;
        anyhow::Ok(())
    })?;

    if json {
        print_json(&json!({ "email": email, "response_status": status }))
    } else {
        println!("{email}: response recorded as {status}");
        Ok(())
    }
}

/// Only reply outcomes can be recorded; `pending` is the starting state.
fn parse_terminal(raw: &str) -> anyhow::Result<ResponseStatus> {
    let status: Option<ResponseStatus> = raw.parse().ok();
    match status {
        Some(s) if s.is_terminal() => Ok(s),
        _ => {
            let allowed: Vec<String> = ResponseStatus::all()
                .iter()
                .filter(|s| s.is_terminal())
                .map(|s| s.as_str().replace('_', "-"))
                .collect();
            bail!("invalid status '{raw}': expected one of {}", allowed.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_either_spelling() {
        assert_eq!(
            parse_terminal("not-interested").unwrap(),
            ResponseStatus::NotInterested
        );
        assert_eq!(
            parse_terminal("no_response").unwrap(),
            ResponseStatus::NoResponse
        );
    }

    #[test]
    fn rejects_pending_and_unknown() {
        let err = parse_terminal("pending").unwrap_err().to_string();
        assert!(err.contains("interested, not-interested, no-response"));
        assert!(parse_terminal("maybe").is_err());
    }
}
