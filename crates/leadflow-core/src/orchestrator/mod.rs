//! Lead workflow orchestration.
//!
//! Provides `Orchestrator` (one decide-and-act pass over the lead store),
//! `Scheduler` (the fixed-interval, non-overlapping driver), and
//! `CycleSummary` (what a pass did, rendered into the stakeholder report).

pub mod cycle;
pub mod scheduler;
pub mod summary;


pub use cycle::{Adapters, Orchestrator};
pub use scheduler::Scheduler;
pub use summary::{CycleSummary, LeadOutcome, Outcome, Report};
