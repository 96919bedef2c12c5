use crate::types::{Lead, ResponseStatus, VerificationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// LeadAction (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Address was verified undeliverable.
    Invalid,
    /// Outreach already concluded with a terminal response.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "reason", rename_all = "snake_case")]
pub enum LeadAction {
    Verify,
    Outreach,
    Skip(SkipReason),
}

impl LeadAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadAction::Verify => "verify",
            LeadAction::Outreach => "outreach",
            LeadAction::Skip(SkipReason::Invalid) => "skip (invalid)",
            LeadAction::Skip(SkipReason::Complete) => "skip (complete)",
        }
    }
}

impl fmt::Display for LeadAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A fn-pointer rule over a single lead's status pair.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&Lead) -> bool,
    pub action: LeadAction,
}

/// The lead state table, in priority order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "unverified",
            condition: |l| l.verification_status == VerificationStatus::Unknown,
            action: LeadAction::Verify,
        },
        Rule {
            id: "undeliverable",
            condition: |l| l.verification_status == VerificationStatus::Invalid,
            action: LeadAction::Skip(SkipReason::Invalid),
        },
        Rule {
            id: "awaiting_outreach",
            condition: |l| {
                l.verification_status == VerificationStatus::Valid
                    && l.response_status == ResponseStatus::Pending
            },
            action: LeadAction::Outreach,
        },
    ]
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// First matching rule wins. A lead no rule claims is complete.
    pub fn classify(&self, lead: &Lead) -> LeadAction {
        self.rules
            .iter()
            .find(|rule| (rule.condition)(lead))
            .map(|rule| {
                tracing::trace!(email = %lead.email, rule = rule.id, "lead classified");
                rule.action
            })
            .unwrap_or(LeadAction::Skip(SkipReason::Complete))
    }

    /// Split leads into disjoint work sets for one cycle.
    pub fn partition(&self, leads: Vec<Lead>) -> Plan {
        let mut plan = Plan::default();
        for lead in leads {
            match self.classify(&lead) {
                LeadAction::Verify => plan.verify.push(lead),
                LeadAction::Outreach => plan.outreach.push(lead),
                LeadAction::Skip(reason) => plan.skipped.push((lead, reason)),
            }
        }
        plan
    }
}

/// Work sets derived from a lead snapshot. Each lead appears in exactly one.
#[derive(Debug, Default)]
pub struct Plan {
    pub verify: Vec<Lead>,
    pub outreach: Vec<Lead>,
    pub skipped: Vec<(Lead, SkipReason)>,
}

impl Plan {
    pub fn total(&self) -> usize {
        self.verify.len() + self.outreach.len() + self.skipped.len()
    }
}
