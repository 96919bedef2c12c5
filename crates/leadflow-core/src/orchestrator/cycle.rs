use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::adapters::{InboxPoller, LeadStore, Mailer, Personalizer, Verifier};
use crate::classifier::Classifier;
use crate::config::WorkflowConfig;
use crate::error::{LeadflowError, Result};
use crate::types::{Lead, LeadUpdate, Verdict};

use super::summary::{CycleSummary, Outcome};

// ─── Adapters ─────────────────────────────────────────────────────────────

/// The external collaborators a cycle drives.
#[derive(Clone)]
pub struct Adapters {
    pub store: Arc<dyn LeadStore>,
    pub verifier: Arc<dyn Verifier>,
    pub personalizer: Arc<dyn Personalizer>,
    pub mailer: Arc<dyn Mailer>,
    pub inbox: Arc<dyn InboxPoller>,
}

// ─── Orchestrator ─────────────────────────────────────────────────────────

/// Applies the lead state table to the current store snapshot.
///
/// Holds no lead state between cycles. The only state it owns is the cycle
/// lock, which keeps two cycles from running at once.
pub struct Orchestrator {
    adapters: Adapters,
    classifier: Classifier,
    settings: WorkflowConfig,
    cycle_lock: Mutex<()>,
}

impl Orchestrator {
    pub fn new(adapters: Adapters, settings: WorkflowConfig) -> Self {
        Self {
            adapters,
            classifier: Classifier::default(),
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    /// True while a cycle holds the lock.
    pub fn is_running(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Run one full cycle: poll, fetch, verify, reach out, report.
    ///
    /// A call made while another cycle is in flight waits for it to finish.
    /// Adapter failures are logged and folded into the summary; they never
    /// abort the cycle.
    pub async fn run_cycle(&self) -> CycleSummary {
        if self.is_running() {
            tracing::info!("cycle already running; waiting for it to finish");
        }
        let _running = self.cycle_lock.lock().await;

        let mut summary = CycleSummary::new(Utc::now());
        tracing::info!("lead cycle started");

        let criteria = self.settings.trigger_criteria();
        let triggers = match self
            .bounded("inbox", self.adapters.inbox.poll(&criteria))
            .await
        {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "inbox poll failed; continuing without triggers");
                Vec::new()
            }
        };
        summary.trigger_events = triggers.len();
        for event in &triggers {
            tracing::info!(subject = %event.subject, from = %event.from, "trigger message");
        }

        if self.settings.require_trigger && triggers.is_empty() {
            tracing::info!("no trigger message; cycle skipped");
            summary.skipped_no_trigger = true;
            summary.finished_at = Some(Utc::now());
            return summary;
        }

        let leads = match self
            .bounded("lead store", self.adapters.store.fetch_actionable())
            .await
        {
            Ok(leads) => leads,
            Err(e) => {
                tracing::warn!(error = %e, "lead fetch failed; processing no leads");
                summary.store_error = Some(e.to_string());
                Vec::new()
            }
        };

        let plan = self.classifier.partition(leads);
        summary.total_leads = plan.total();
        tracing::info!(
            verify = plan.verify.len(),
            outreach = plan.outreach.len(),
            skipped = plan.skipped.len(),
            "leads classified"
        );

        for (lead, reason) in plan.skipped {
            summary.record(lead.email, Outcome::Skipped { reason });
        }

        let verified: Vec<(String, Outcome)> = stream::iter(plan.verify)
            .map(|lead| self.verify_lead(lead))
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await;
        for (email, outcome) in verified {
            summary.record(email, outcome);
        }

        let reached: Vec<(String, Outcome)> = stream::iter(plan.outreach)
            .map(|lead| self.outreach_lead(lead))
            .buffer_unordered(self.settings.concurrency)
            .collect()
            .await;
        for (email, outcome) in reached {
            summary.record(email, outcome);
        }

        summary.finished_at = Some(Utc::now());
        summary.report_sent = self.send_report(&summary).await;

        tracing::info!(
            total = summary.total_leads,
            valid = summary.verified_valid,
            invalid = summary.verified_invalid,
            sent = summary.outreach_sent,
            failed = summary.outreach_failed,
            "lead cycle finished"
        );
        summary
    }

    async fn verify_lead(&self, lead: Lead) -> (String, Outcome) {
        let checked = self
            .bounded("verifier", self.adapters.verifier.verify(&lead.email))
            .await;
        let verdict = match checked {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    email = %lead.email,
                    error = %e,
                    "verification failed; lead stays unknown"
                );
                return (
                    lead.email,
                    Outcome::VerificationFailed {
                        error: e.to_string(),
                    },
                );
            }
        };

        let update = match lead.verification_update(verdict, Utc::now()) {
            Ok(Some(update)) => update,
            Ok(None) => {
                tracing::info!(email = %lead.email, "verification inconclusive");
                return (lead.email, Outcome::Inconclusive);
            }
            Err(e) => {
                tracing::warn!(email = %lead.email, error = %e, "verification result rejected");
                return (
                    lead.email,
                    Outcome::VerificationFailed {
                        error: e.to_string(),
                    },
                );
            }
        };

        if let Err(e) = self.write(&lead, &update).await {
            return (
                lead.email,
                Outcome::VerificationFailed {
                    error: format!("store update failed: {e}"),
                },
            );
        }

        let outcome = match verdict {
            Verdict::Invalid => Outcome::VerifiedInvalid,
            _ => Outcome::VerifiedValid,
        };
        tracing::info!(email = %lead.email, status = %verdict.status(), "lead verified");
        (lead.email, outcome)
    }

    async fn outreach_lead(&self, lead: Lead) -> (String, Outcome) {
        let generated = self
            .bounded(
                "personalizer",
                self.adapters
                    .personalizer
                    .generate(&lead.name, &lead.company, &lead.industry),
            )
            .await;
        let body = match generated {
            Ok(body) => body,
            Err(e) => {
                return self
                    .outreach_failed(lead, format!("personalization failed: {e}"))
                    .await
            }
        };

        let subject = &self.settings.outreach_subject;
        let sent = self
            .bounded("mailer", self.adapters.mailer.send(&lead.email, subject, &body))
            .await;
        if let Err(e) = sent {
            return self.outreach_failed(lead, format!("send failed: {e}")).await;
        }

        tracing::info!(email = %lead.email, "outreach sent");
        let update = lead.note_update(&format!("Outreach email sent: \"{subject}\""), Utc::now());
        // Mail is already out; a failed note write still counts as sent.
        let _ = self.write(&lead, &update).await;
        (lead.email, Outcome::Sent)
    }

    async fn outreach_failed(&self, lead: Lead, error: String) -> (String, Outcome) {
        tracing::warn!(
            email = %lead.email,
            error = %error,
            "outreach failed; left for manual follow-up"
        );
        let update = lead.refresh_note(
            "Outreach failed, manual follow-up needed",
            &error,
            Utc::now(),
        );
        let _ = self.write(&lead, &update).await;
        (lead.email, Outcome::SendFailed { error })
    }

    async fn write(&self, lead: &Lead, update: &LeadUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let result = self
            .bounded("lead store", self.adapters.store.update(&lead.key, update))
            .await;
        if let Err(e) = &result {
            tracing::warn!(email = %lead.email, error = %e, "lead update failed");
        }
        result
    }

    async fn send_report(&self, summary: &CycleSummary) -> bool {
        let report = summary.render_report();
        let to = &self.settings.stakeholder_email;
        match self
            .bounded(
                "mailer",
                self.adapters.mailer.send(to, &report.subject, &report.body),
            )
            .await
        {
            Ok(()) => {
                tracing::info!(to = %to, "summary report sent");
                true
            }
            Err(e) => {
                tracing::warn!(to = %to, error = %e, "summary report not sent");
                false
            }
        }
    }

    /// Run an adapter call under the configured per-call timeout.
    async fn bounded<T, F>(&self, adapter: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        bounded(self.settings.call_timeout, adapter, call).await
    }
}

async fn bounded<T, F>(limit: Duration, adapter: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(LeadflowError::AdapterTimeout {
            adapter,
            secs: limit.as_secs(),
        }),
    }
}
