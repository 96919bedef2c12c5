//! Seams between the orchestrator and the external services it drives.
//!
//! Each trait covers one capability. Production implementations live in the
//! `leadflow-clients` crate; tests substitute in-process fakes.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::{LeadflowError, Result};
use crate::types::{Lead, LeadUpdate, ResponseStatus, TriggerEvent, VerificationStatus, Verdict};

/// Hosted lead database.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Every lead whose verification is Unknown or whose response is Pending.
    async fn fetch_actionable(&self) -> Result<Vec<Lead>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>>;

    async fn update(&self, key: &str, update: &LeadUpdate) -> Result<()>;
}

/// Email deliverability check.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, email: &str) -> Result<Verdict>;
}

/// Generated outreach copy.
#[async_trait]
pub trait Personalizer: Send + Sync {
    async fn generate(&self, name: &str, company: &str, industry: &str) -> Result<String>;
}

/// Outbound mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Inbox search for trigger messages.
#[async_trait]
pub trait InboxPoller: Send + Sync {
    /// At most the five most recent matches for `criteria`.
    async fn poll(&self, criteria: &str) -> Result<Vec<TriggerEvent>>;
}

// ---------------------------------------------------------------------------
// MemoryLeadStore
// ---------------------------------------------------------------------------

/// In-memory lead store for development and testing.
#[derive(Default)]
pub struct MemoryLeadStore {
    leads: RwLock<Vec<Lead>>,
}

impl MemoryLeadStore {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: RwLock::new(leads),
        }
    }

    pub fn snapshot(&self) -> Vec<Lead> {
        self.leads.read().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn get(&self, email: &str) -> Option<Lead> {
        self.snapshot().into_iter().find(|l| l.email == email)
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> LeadflowError {
    LeadflowError::transport("memory store", e.to_string())
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn fetch_actionable(&self) -> Result<Vec<Lead>> {
        let leads = self.leads.read().map_err(poisoned)?;
        Ok(leads
            .iter()
            .filter(|l| {
                l.verification_status == VerificationStatus::Unknown
                    || l.response_status == ResponseStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>> {
        let leads = self.leads.read().map_err(poisoned)?;
        Ok(leads
            .iter()
            .find(|l| l.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, key: &str, update: &LeadUpdate) -> Result<()> {
        let mut leads = self.leads.write().map_err(poisoned)?;
        let lead = leads
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or_else(|| LeadflowError::LeadNotFound(key.to_string()))?;
        lead.apply(update);
        Ok(())
    }
}
