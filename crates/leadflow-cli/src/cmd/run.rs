use leadflow_core::orchestrator::{Orchestrator, Scheduler};
use std::path::Path;
use std::sync::Arc;

pub fn run(env_file: Option<&Path>, now: bool) -> anyhow::Result<()> {
    let config = super::load_config(env_file)?;
    let adapters = leadflow_clients::build_adapters(&config)?;
    let interval = config.workflow.cycle_interval;
    let orchestrator = Arc::new(Orchestrator::new(adapters, config.workflow));
    let scheduler = Scheduler::new(orchestrator, interval);

    let rt = super::runtime()?;
    let completed = rt.block_on(scheduler.run_until(now, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C; stopping");
        }
    }));

    println!("stopped after {completed} cycle(s)");
    Ok(())
}
