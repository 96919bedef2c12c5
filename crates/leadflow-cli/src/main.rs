mod cmd;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "leadflow",
    about = "Scheduled lead verification and personalized outreach",
    version,
    propagate_version = true
)]
struct Cli {
    /// Load environment from this file (default: ./.env if present)
    #[arg(long, global = true, env = "LEADFLOW_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run workflow cycles on a fixed interval until Ctrl-C
    Run {
        /// Start the first cycle immediately instead of after one interval
        #[arg(long)]
        now: bool,
    },

    /// Run a single cycle and print its summary
    Once,

    /// Validate configuration and show the effective settings
    CheckConfig,

    /// List actionable leads and the action each would get
    Leads,

    /// Record a reply outcome for a lead still awaiting one
    Mark {
        /// Lead email address
        email: String,
        /// interested, not-interested, or no-response
        status: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Once => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let env_file = cli.env_file.as_deref();

    let result = match cli.command {
        Commands::Run { now } => cmd::run::run(env_file, now),
        Commands::Once => cmd::once::run(env_file, cli.json),
        Commands::CheckConfig => cmd::check_config::run(env_file, cli.json),
        Commands::Leads => cmd::leads::run(env_file, cli.json),
        Commands::Mark { email, status } => cmd::mark::run(env_file, &email, &status, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
