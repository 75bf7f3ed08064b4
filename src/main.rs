//! dynox-local - local DynamoDB table registry.
//!
//! The main entry point for the `dynox-local` binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynox_local::cli::{Cli, Commands};
use dynox_local::commands::{self, format_report};
use dynox_local::config::Config;
use dynox_local::source::{TableSource, TemplateFile};
use dynox_local::watch::FilePoller;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let template = TemplateFile::new(&cli.config);
    let settings = template
        .read()
        .await
        .context("failed to read service template")?
        .plugin_settings();
    let config = Config::resolve(cli.config.clone(), &cli.overrides(), &settings);
    let json = cli.server_args().json;

    let source: Arc<dyn TableSource> = Arc::new(template);
    let session = match cli.command {
        Commands::Start(_) => commands::start(&config, source).await,
        Commands::Watch(_) => {
            let poller = FilePoller::new(&config.template_path, config.poll_interval);
            commands::watch(&config, source, poller).await
        }
    }
    .context("failed to start local registry")?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.initial_report())?);
    } else {
        println!("{}", format_report(session.initial_report()));
    }
    info!(endpoint = %session.endpoint_url(), "ready, press Ctrl-C to stop");

    shutdown_signal().await;
    info!("shutting down");
    session.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
