pub mod adapters;
pub mod classifier;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod types;

pub use error::{LeadflowError, Result};
