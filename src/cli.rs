//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_TEMPLATE_PATH, Overrides};

/// Local DynamoDB table registry that keeps declared tables in place.
#[derive(Debug, Parser)]
#[command(name = "dynox-local")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Service template (JSON) declaring the tables.
    #[arg(long, global = true, env = "DYNOX_CONFIG", default_value = DEFAULT_TEMPLATE_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the registry and create the declared tables once.
    Start(ServerArgs),
    /// Start the registry and keep the declared tables in sync with the
    /// template.
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServerArgs {
    /// Port to listen on.
    #[arg(long, env = "DYNOX_PORT")]
    pub port: Option<u16>,

    /// Address to bind.
    #[arg(long, env = "DYNOX_HOST")]
    pub host: Option<String>,

    /// Region reported in table ARNs.
    #[arg(long, env = "DYNOX_REGION")]
    pub region: Option<String>,

    /// Milliseconds a new table stays CREATING.
    #[arg(long)]
    pub create_table_ms: Option<u64>,

    /// Milliseconds a deleted table stays DELETING.
    #[arg(long)]
    pub delete_table_ms: Option<u64>,

    /// Pause before the final listing of a pass, in milliseconds.
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Table creations in flight at once.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Give up on a single table creation after this many milliseconds.
    #[arg(long)]
    pub create_timeout_ms: Option<u64>,

    /// Print the reconcile report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Template poll interval in milliseconds.
    #[arg(long)]
    pub interval: Option<u64>,
}

impl Cli {
    pub fn server_args(&self) -> &ServerArgs {
        match &self.command {
            Commands::Start(args) => args,
            Commands::Watch(args) => &args.server,
        }
    }

    /// Values given explicitly on the command line or in the environment.
    pub fn overrides(&self) -> Overrides {
        let args = self.server_args();
        let poll_interval_ms = match &self.command {
            Commands::Watch(args) => args.interval,
            Commands::Start(_) => None,
        };

        Overrides {
            host: args.host.clone(),
            port: args.port,
            region: args.region.clone(),
            create_table_ms: args.create_table_ms,
            delete_table_ms: args.delete_table_ms,
            settle_ms: args.settle_ms,
            poll_interval_ms,
            max_concurrency: args.max_concurrency,
            create_timeout_ms: args.create_timeout_ms,
        }
    }
}
