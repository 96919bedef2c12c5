pub mod check_config;
pub mod leads;
pub mod mark;
pub mod once;
pub mod run;

use anyhow::Context;
use leadflow_core::config::Config;
use std::path::Path;

/// Load `env_file` (or `./.env` when present) into the process environment,
/// then read configuration from it. Variables already set take precedence.
pub fn load_config(env_file: Option<&Path>) -> anyhow::Result<Config> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            if let Err(e) = dotenvy::dotenv() {
                if !e.not_found() {
                    return Err(e).context("failed to load .env");
                }
            }
        }
    }
    Ok(Config::from_env()?)
}

pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}
