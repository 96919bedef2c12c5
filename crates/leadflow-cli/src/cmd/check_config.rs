use crate::output::{print_fields, print_json};
use leadflow_core::config::Config;
use std::path::Path;

pub fn run(env_file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(env_file)?;
    if json {
        return print_json(&config);
    }
    print_fields(&fields(&config));
    println!("\nconfiguration ok");
    Ok(())
}

/// Effective non-secret settings. Secrets are reported only as present.
fn fields(config: &Config) -> Vec<(&'static str, String)> {
    let w = &config.workflow;
    let m = &config.mail;
    vec![
        ("notion database", config.notion.database_id.clone()),
        ("notion api", config.notion.api_base.clone()),
        ("hunter api", config.hunter.api_base.clone()),
        ("openai api", config.openai.api_base.clone()),
        ("openai model", config.openai.model.clone()),
        ("smtp", format!("{}:{}", m.smtp_server, m.smtp_port)),
        ("imap", format!("{}:{}", m.imap_server, m.imap_port)),
        ("sender", format!("{} <{}>", m.sender_name, m.address)),
        ("stakeholder", w.stakeholder_email.clone()),
        ("trigger subject", w.trigger_subject.clone()),
        ("require trigger", w.require_trigger.to_string()),
        ("outreach subject", w.outreach_subject.clone()),
        ("cycle interval", format!("{}m", w.cycle_interval.as_secs() / 60)),
        ("call timeout", format!("{}s", w.call_timeout.as_secs())),
        ("concurrency", w.concurrency.to_string()),
        ("api keys", "set".to_string()),
    ]
}
