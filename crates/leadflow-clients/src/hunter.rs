use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::adapters::Verifier;
use leadflow_core::config::HunterConfig;
use leadflow_core::types::Verdict;
use leadflow_core::{LeadflowError, Result};
use serde::Deserialize;

use crate::http::{check_status, client, request_error};

const ADAPTER: &str = "hunter";

#[derive(Debug, Deserialize)]
struct VerifierResponse {
    data: Option<VerifierData>,
}

#[derive(Debug, Deserialize)]
struct VerifierData {
    status: Option<String>,
}

/// Email verification through Hunter's `email-verifier` endpoint.
pub struct HunterVerifier {
    http: reqwest::Client,
    config: HunterConfig,
    timeout: Duration,
}

impl HunterVerifier {
    pub fn new(config: HunterConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: client(ADAPTER, timeout)?,
            config,
            timeout,
        })
    }
}

#[async_trait]
impl Verifier for HunterVerifier {
    async fn verify(&self, email: &str) -> Result<Verdict> {
        let url = format!("{}/v2/email-verifier", self.config.api_base);
        let resp = self
            .http
            .get(&url)
            .query(&[("email", email), ("api_key", self.config.api_key.expose())])
            .send()
            .await
            .map_err(|e| request_error(ADAPTER, self.timeout, e))?;
        let body: VerifierResponse = check_status(ADAPTER, resp)
            .await?
            .json()
            .await
            .map_err(|e| request_error(ADAPTER, self.timeout, e))?;

        let status = body
            .data
            .and_then(|d| d.status)
            .ok_or_else(|| LeadflowError::bad_response(ADAPTER, "response has no data.status"))?;
        Ok(verdict_for(&status))
    }
}

/// `accept_all` servers take every address, so they prove nothing either way.
fn verdict_for(status: &str) -> Verdict {
    match status {
        "valid" | "webmail" => Verdict::Valid,
        "invalid" | "disposable" => Verdict::Invalid,
        _ => Verdict::Unknown,
    }
}
