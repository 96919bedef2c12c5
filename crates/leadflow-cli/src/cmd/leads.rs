use crate::output::{print_json, print_table};
use anyhow::Context;
use leadflow_clients::NotionStore;
use leadflow_core::adapters::LeadStore;
use leadflow_core::classifier::{Classifier, LeadAction};
use leadflow_core::types::Lead;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Row {
    #[serde(flatten)]
    lead: Lead,
    action: LeadAction,
}

pub fn run(env_file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(env_file)?;
    let store = NotionStore::new(config.notion.clone(), config.workflow.call_timeout)?;
    let leads = super::runtime()?
        .block_on(store.fetch_actionable())
        .context("failed to fetch leads")?;

    let classifier = Classifier::default();
    let rows: Vec<Row> = leads
        .into_iter()
        .map(|lead| Row {
            action: classifier.classify(&lead),
            lead,
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("No actionable leads.");
        return Ok(());
    }
    print_table(
        &["EMAIL", "NAME", "COMPANY", "VERIFIED", "RESPONSE", "ACTION"],
        rows.iter()
            .map(|r| {
                vec![
                    r.lead.email.clone(),
                    r.lead.name.clone(),
                    r.lead.company.clone(),
                    r.lead.verification_status.to_string(),
                    r.lead.response_status.to_string(),
                    r.action.to_string(),
                ]
            })
            .collect(),
    );
    Ok(())
}
