//! Per-cycle outcome tally and the stakeholder report rendered from it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

use crate::classifier::SkipReason;

// ---------------------------------------------------------------------------
// LeadOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    VerifiedValid,
    VerifiedInvalid,
    /// Verifier could not decide; retried next cycle.
    Inconclusive,
    /// Verifier or store call failed; retried next cycle.
    VerificationFailed { error: String },
    Sent,
    SendFailed { error: String },
    Skipped { reason: SkipReason },
}

impl Outcome {
    pub fn describe(&self) -> String {
        match self {
            Outcome::VerifiedValid => "verified valid".into(),
            Outcome::VerifiedInvalid => "verified invalid".into(),
            Outcome::Inconclusive => "verification inconclusive, retry next cycle".into(),
            Outcome::VerificationFailed { error } => format!("verification failed: {error}"),
            Outcome::Sent => "outreach sent".into(),
            Outcome::SendFailed { error } => format!("outreach failed: {error}"),
            Outcome::Skipped {
                reason: SkipReason::Invalid,
            } => "skipped, invalid address".into(),
            Outcome::Skipped {
                reason: SkipReason::Complete,
            } => "skipped, outreach complete".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadOutcome {
    pub email: String,
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// CycleSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub trigger_events: usize,
    /// Set when the cycle was skipped because no trigger message arrived.
    pub skipped_no_trigger: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    pub total_leads: usize,
    pub verified_valid: usize,
    pub verified_invalid: usize,
    pub verification_pending: usize,
    pub outreach_sent: usize,
    pub outreach_failed: usize,
    pub skipped: usize,
    pub report_sent: bool,
    pub outcomes: Vec<LeadOutcome>,
}

impl CycleSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            trigger_events: 0,
            skipped_no_trigger: false,
            store_error: None,
            total_leads: 0,
            verified_valid: 0,
            verified_invalid: 0,
            verification_pending: 0,
            outreach_sent: 0,
            outreach_failed: 0,
            skipped: 0,
            report_sent: false,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, email: impl Into<String>, outcome: Outcome) {
        match &outcome {
            Outcome::VerifiedValid => self.verified_valid += 1,
            Outcome::VerifiedInvalid => self.verified_invalid += 1,
            Outcome::Inconclusive | Outcome::VerificationFailed { .. } => {
                self.verification_pending += 1
            }
            Outcome::Sent => self.outreach_sent += 1,
            Outcome::SendFailed { .. } => self.outreach_failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
        self.outcomes.push(LeadOutcome {
            email: email.into(),
            outcome,
        });
    }

    pub fn outcome_for(&self, email: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.email == email)
            .map(|o| &o.outcome)
    }

    /// Plain-text report for the stakeholder mail.
    pub fn render_report(&self) -> Report {
        let subject = format!(
            "Lead workflow summary ({})",
            self.started_at.format("%Y-%m-%d %H:%M UTC")
        );

        let mut body = String::new();
        let _ = writeln!(body, "Lead workflow cycle report");
        let _ = writeln!(body);
        let _ = writeln!(body, "Trigger messages seen:   {}", self.trigger_events);
        let _ = writeln!(body, "Leads examined:          {}", self.total_leads);
        let _ = writeln!(body, "Verified valid:          {}", self.verified_valid);
        let _ = writeln!(body, "Verified invalid:        {}", self.verified_invalid);
        let _ = writeln!(body, "Awaiting verification:   {}", self.verification_pending);
        let _ = writeln!(body, "Outreach emails sent:    {}", self.outreach_sent);
        let _ = writeln!(body, "Outreach failures:       {}", self.outreach_failed);
        let _ = writeln!(body, "Skipped:                 {}", self.skipped);

        if let Some(err) = &self.store_error {
            let _ = writeln!(body);
            let _ = writeln!(body, "Lead store could not be read this cycle: {err}");
        }

        let _ = writeln!(body);
        let acted: Vec<&LeadOutcome> = self
            .outcomes
            .iter()
            .filter(|o| !matches!(o.outcome, Outcome::Skipped { .. }))
            .collect();
        if acted.is_empty() {
            let _ = writeln!(body, "No leads required action this cycle.");
        } else {
            let _ = writeln!(body, "Details:");
            for o in acted {
                let _ = writeln!(body, "- {}: {}", o.email, o.outcome.describe());
            }
        }

        Report { subject, body }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub subject: String,
    pub body: String,
}
