//! Production adapters for the lead workflow.
//!
//! Each module implements one of the `leadflow_core::adapters` traits
//! against a real service. [`build_adapters`] wires them from a loaded
//! [`Config`].

mod http;

pub mod hunter;
pub mod inbox;
pub mod notion;
pub mod openai;
pub mod smtp;

use std::sync::Arc;

use leadflow_core::config::Config;
use leadflow_core::orchestrator::Adapters;
use leadflow_core::Result;

pub use hunter::HunterVerifier;
pub use inbox::ImapPoller;
pub use notion::NotionStore;
pub use openai::OpenAiPersonalizer;
pub use smtp::SmtpMailer;

/// Construct every adapter. Nothing connects until first use.
pub fn build_adapters(config: &Config) -> Result<Adapters> {
    let timeout = config.workflow.call_timeout;
    Ok(Adapters {
        store: Arc::new(NotionStore::new(config.notion.clone(), timeout)?),
        verifier: Arc::new(HunterVerifier::new(config.hunter.clone(), timeout)?),
        personalizer: Arc::new(OpenAiPersonalizer::new(
            config.openai.clone(),
            config.mail.sender_name.clone(),
            timeout,
        )?),
        mailer: Arc::new(SmtpMailer::new(&config.mail, timeout)?),
        inbox: Arc::new(ImapPoller::new(config.mail.clone(), timeout)),
    })
}
