use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LeadflowError, Result};

// ---------------------------------------------------------------------------
// VerificationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Unknown => "unknown",
            VerificationStatus::Valid => "valid",
            VerificationStatus::Invalid => "invalid",
        }
    }

    /// Unknown is the only status that may still change.
    pub fn is_decided(self) -> bool {
        !matches!(self, VerificationStatus::Unknown)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = LeadflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unknown" => Ok(VerificationStatus::Unknown),
            "valid" => Ok(VerificationStatus::Valid),
            "invalid" => Ok(VerificationStatus::Invalid),
            _ => Err(LeadflowError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ResponseStatus
// ---------------------------------------------------------------------------

/// Reply state of a lead.
///
/// Transitions: `Pending → Interested | NotInterested | NoResponse`. The three
/// terminal values never change once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Pending,
    Interested,
    NotInterested,
    NoResponse,
}

impl ResponseStatus {
    pub fn all() -> &'static [ResponseStatus] {
        &[
            ResponseStatus::Pending,
            ResponseStatus::Interested,
            ResponseStatus::NotInterested,
            ResponseStatus::NoResponse,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Interested => "interested",
            ResponseStatus::NotInterested => "not_interested",
            ResponseStatus::NoResponse => "no_response",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ResponseStatus::Pending)
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResponseStatus {
    type Err = LeadflowError;

    /// Accepts both `not_interested` and `not-interested` spellings.
    fn from_str(s: &str) -> Result<Self> {
        match s.replace('-', "_").as_str() {
            "pending" => Ok(ResponseStatus::Pending),
            "interested" => Ok(ResponseStatus::Interested),
            "not_interested" => Ok(ResponseStatus::NotInterested),
            "no_response" => Ok(ResponseStatus::NoResponse),
            _ => Err(LeadflowError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of verifying a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid,
    Unknown,
}

impl Verdict {
    pub fn status(self) -> VerificationStatus {
        match self {
            Verdict::Valid => VerificationStatus::Valid,
            Verdict::Invalid => VerificationStatus::Invalid,
            Verdict::Unknown => VerificationStatus::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Lead
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Record identifier in the lead store. Used to address updates.
    pub key: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub response_status: ResponseStatus,
    #[serde(default)]
    pub notes: String,
}

impl Lead {
    /// Create a fresh lead in `Unknown`/`Pending` state.
    pub fn new(key: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            email: email.into(),
            name: String::new(),
            company: String::new(),
            industry: String::new(),
            verification_status: VerificationStatus::Unknown,
            response_status: ResponseStatus::Pending,
            notes: String::new(),
        }
    }

    /// Notes text with `text` appended as a new timestamped line.
    pub fn notes_with(&self, text: &str, now: DateTime<Utc>) -> String {
        append_note(&self.notes, text, now)
    }

    /// An update that only appends a note.
    pub fn note_update(&self, text: &str, now: DateTime<Utc>) -> LeadUpdate {
        LeadUpdate {
            notes: Some(self.notes_with(text, now)),
            ..Default::default()
        }
    }

    /// Note `"{kind}: {detail}"`, replacing the newest line instead of
    /// appending when that line is already a `kind` note. Repeated failures
    /// keep one refreshed line.
    pub fn refresh_note(&self, kind: &str, detail: &str, now: DateTime<Utc>) -> LeadUpdate {
        let notes = self.notes.trim_end();
        let (earlier, newest) = notes.rsplit_once('\n').unwrap_or(("", notes));
        let repeated = newest
            .split_once("] ")
            .is_some_and(|(_, body)| body.starts_with(kind));
        let base = if repeated { earlier } else { notes };
        LeadUpdate {
            notes: Some(append_note(base, &format!("{kind}: {detail}"), now)),
            ..Default::default()
        }
    }

    /// Build the write-back for a verification verdict.
    ///
    /// Returns `Ok(None)` for an inconclusive verdict: nothing changes and the
    /// lead is retried next cycle. A lead whose status is already decided
    /// cannot be re-verified.
    pub fn verification_update(
        &self,
        verdict: Verdict,
        now: DateTime<Utc>,
    ) -> Result<Option<LeadUpdate>> {
        if self.verification_status.is_decided() {
            return Err(LeadflowError::InvalidTransition {
                from: self.verification_status.to_string(),
                to: verdict.status().to_string(),
                reason: "verification status is already decided".into(),
            });
        }
        let note = match verdict {
            Verdict::Unknown => return Ok(None),
            Verdict::Valid => "Email verified: deliverable",
            Verdict::Invalid => "Email verified: undeliverable, excluded from outreach",
        };
        Ok(Some(LeadUpdate {
            verification_status: Some(verdict.status()),
            notes: Some(self.notes_with(note, now)),
            ..Default::default()
        }))
    }

    /// Build the write-back that records a reply outcome.
    ///
    /// Only `Pending → terminal` is allowed.
    pub fn response_update(
        &self,
        status: ResponseStatus,
        now: DateTime<Utc>,
    ) -> Result<LeadUpdate> {
        if self.response_status.is_terminal() {
            return Err(LeadflowError::InvalidTransition {
                from: self.response_status.to_string(),
                to: status.to_string(),
                reason: "response status is terminal".into(),
            });
        }
        if !status.is_terminal() {
            return Err(LeadflowError::InvalidTransition {
                from: self.response_status.to_string(),
                to: status.to_string(),
                reason: "target status must be terminal".into(),
            });
        }
        Ok(LeadUpdate {
            response_status: Some(status),
            notes: Some(self.notes_with(&format!("Response recorded: {status}"), now)),
            ..Default::default()
        })
    }

    /// Apply an update in place. Email and key are never touched.
    pub fn apply(&mut self, update: &LeadUpdate) {
        if let Some(v) = update.verification_status {
            self.verification_status = v;
        }
        if let Some(r) = update.response_status {
            self.response_status = r;
        }
        if let Some(notes) = &update.notes {
            self.notes = notes.clone();
        }
    }
}

fn append_note(notes: &str, text: &str, now: DateTime<Utc>) -> String {
    let line = format!("[{}] {}", now.format("%Y-%m-%d %H:%M UTC"), text.trim());
    if notes.trim().is_empty() {
        line
    } else {
        format!("{}\n{}", notes.trim_end(), line)
    }
}

// ---------------------------------------------------------------------------
// LeadUpdate
// ---------------------------------------------------------------------------

/// Fields written back to the store for one lead.
///
/// `notes` carries the full replacement text (existing notes plus any
/// appended line), since the store overwrites the property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<ResponseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LeadUpdate {
    pub fn is_empty(&self) -> bool {
        self.verification_status.is_none()
            && self.response_status.is_none()
            && self.notes.is_none()
    }
}

// ---------------------------------------------------------------------------
// TriggerEvent
// ---------------------------------------------------------------------------

/// A message seen in the monitored inbox. Header values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub subject: String,
    pub from: String,
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn notes_append_on_new_line() {
        let mut lead = Lead::new("p1", "a@example.com");
        assert_eq!(lead.notes_with("first", at()), "[2026-03-04 09:30 UTC] first");
        lead.notes = "older".into();
        assert_eq!(
            lead.notes_with("second", at()),
            "older\n[2026-03-04 09:30 UTC] second"
        );
    }

    #[test]
    fn refresh_note_replaces_repeated_kind() {
        let mut lead = Lead::new("p1", "a@example.com");
        lead.notes = "[2026-03-01 08:00 UTC] Email verified: deliverable".into();

        let first = lead.refresh_note("Outreach failed", "smtp down", at());
        lead.apply(&first);
        let second = lead.refresh_note("Outreach failed", "still down", at());
        lead.apply(&second);

        assert_eq!(
            lead.notes,
            "[2026-03-01 08:00 UTC] Email verified: deliverable\n\
             [2026-03-04 09:30 UTC] Outreach failed: still down"
        );
    }

    #[test]
    fn refresh_note_on_single_repeated_line() {
        let mut lead = Lead::new("p1", "a@example.com");
        lead.notes = "[2026-03-01 08:00 UTC] Outreach failed: smtp down".into();
        let update = lead.refresh_note("Outreach failed", "timeout", at());
        assert_eq!(
            update.notes.as_deref(),
            Some("[2026-03-04 09:30 UTC] Outreach failed: timeout")
        );
    }

    #[test]
    fn valid_verdict_sets_status_and_note() {
        let lead = Lead::new("p1", "a@example.com");
        let update = lead
            .verification_update(Verdict::Valid, at())
            .unwrap()
            .unwrap();
        assert_eq!(update.verification_status, Some(VerificationStatus::Valid));
        assert!(update.notes.unwrap().contains("deliverable"));
        assert!(update.response_status.is_none());
    }

    #[test]
    fn unknown_verdict_changes_nothing() {
        let lead = Lead::new("p1", "a@example.com");
        assert!(lead
            .verification_update(Verdict::Unknown, at())
            .unwrap()
            .is_none());
    }

    #[test]
    fn decided_lead_cannot_be_reverified() {
        let mut lead = Lead::new("p1", "a@example.com");
        lead.verification_status = VerificationStatus::Invalid;
        let err = lead.verification_update(Verdict::Valid, at()).unwrap_err();
        assert!(matches!(err, LeadflowError::InvalidTransition { .. }));
    }

    #[test]
    fn terminal_response_is_never_overwritten() {
        let mut lead = Lead::new("p1", "a@example.com");
        lead.response_status = ResponseStatus::Interested;
        let err = lead
            .response_update(ResponseStatus::NotInterested, at())
            .unwrap_err();
        assert!(err.to_string().contains("terminal"));
    }

    #[test]
    fn pending_response_cannot_be_set_to_pending() {
        let lead = Lead::new("p1", "a@example.com");
        assert!(lead
            .response_update(ResponseStatus::Pending, at())
            .is_err());
    }

    #[test]
    fn apply_keeps_identity() {
        let mut lead = Lead::new("p1", "a@example.com");
        let update = lead.response_update(ResponseStatus::NoResponse, at()).unwrap();
        lead.apply(&update);
        assert_eq!(lead.email, "a@example.com");
        assert_eq!(lead.key, "p1");
        assert_eq!(lead.response_status, ResponseStatus::NoResponse);
        assert!(lead.notes.contains("no_response"));
    }

    #[test]
    fn response_status_parses_kebab_case() {
        assert_eq!(
            "not-interested".parse::<ResponseStatus>().unwrap(),
            ResponseStatus::NotInterested
        );
        assert!("maybe".parse::<ResponseStatus>().is_err());
    }

    #[test]
    fn empty_update_detected() {
        assert!(LeadUpdate::default().is_empty());
    }
}
