//! TaskFlux command-line client
//!
//! Thin front end over `taskflux-core`: reads configuration from the
//! environment, restores the saved session and runs one command.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::commands::App;
use taskflux_core::ClientConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflux=info,taskflux_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    tracing::debug!("Using API at {} with data directory {:?}", config.base_url, config.data_dir);

    let app = App::open(&config).await?;
    app.execute(cli.command).await
}
