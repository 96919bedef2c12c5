use crate::output::{print_json, print_table};
use leadflow_core::orchestrator::{CycleSummary, Orchestrator};
use std::path::Path;

pub fn run(env_file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(env_file)?;
    let adapters = leadflow_clients::build_adapters(&config)?;
    let orchestrator = Orchestrator::new(adapters, config.workflow.clone());

    let summary = super::runtime()?.block_on(orchestrator.run_cycle());

    if json {
        return print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &CycleSummary) {
    if summary.skipped_no_trigger {
        println!("No trigger message found; cycle skipped.");
        return;
    }
    if let Some(err) = &summary.store_error {
        println!("Lead store unavailable: {err}");
    }

    let rows: Vec<Vec<String>> = summary
        .outcomes
        .iter()
        .map(|o| vec![o.email.clone(), o.outcome.describe()])
        .collect();
    if rows.is_empty() {
        println!("No leads required action.");
    } else {
        print_table(&["EMAIL", "OUTCOME"], rows);
    }

    println!();
    println!(
        "leads {}  valid {}  invalid {}  pending {}  sent {}  failed {}  skipped {}",
        summary.total_leads,
        summary.verified_valid,
        summary.verified_invalid,
        summary.verification_pending,
        summary.outreach_sent,
        summary.outreach_failed,
        summary.skipped,
    );
    println!(
        "report {}",
        if summary.report_sent {
            "sent"
        } else {
            "NOT sent"
        }
    );
}
