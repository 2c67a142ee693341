// ============================================
// File: crates/mref-server/src/main.rs
// ============================================
//! # mrefd - M17 Reflector Daemon
//!
//! CLI entry point: parse arguments, initialize logging, and either
//! validate a configuration file or start the reflector.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mref_server::config::Config;
use mref_server::server::Reflector;

#[derive(Parser)]
#[command(name = "mrefd", version, about = "M17 digital-voice reflector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the reflector
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "mrefd.toml")]
        config: PathBuf,
    },
    /// Validate a configuration file and exit
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "mrefd.toml")]
        config: PathBuf,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => {
            let config = Config::load(&config)
                .await
                .with_context(|| format!("loading {}", config.display()))?;
            init_logging(&config.logging.level);
            Reflector::new(config).run().await?;
        }
        Commands::Validate { config } => {
            let path = config.clone();
            Config::load(&config)
                .await
                .with_context(|| format!("loading {}", config.display()))?;
            init_logging("info");
            info!(path = %path.display(), "configuration is valid");
        }
    }

    Ok(())
}
