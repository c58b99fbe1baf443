//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use pamdash_core::config::{self, Config};

mod commands;

#[derive(Parser)]
#[command(name = "pamdash")]
#[command(version)]
#[command(about = "Terminal console for privileged-access security events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    server: ServerArgs,
}

/// Overrides shared by every command that talks to the service.
#[derive(clap::Args, Debug, Clone, Default)]
struct ServerArgs {
    /// Base URL of the security-event service
    #[arg(long, global = true, env = "PAMDASH_SERVER", value_name = "URL")]
    server: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the live console (default)
    Watch {
        /// Poll period in seconds (1, 3, 5, 10 or 30)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Page to open first (dashboard, sessions, alerts, settings)
        #[arg(long, value_name = "NAME", default_value = "dashboard")]
        page: String,
    },

    /// Fetch once and print the dashboard
    Snapshot {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Print the service health report
    Health,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

fn load_config(server: &ServerArgs) -> Result<Config> {
    let mut config = Config::load().context("load config")?;
    if let Some(url) = server.server.as_deref() {
        config.server_url = url.trim().to_string();
    }
    config.validate()?;
    Ok(config)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, server } = cli;

    // default to the console
    let command = command.unwrap_or(Commands::Watch {
        interval: None,
        page: "dashboard".to_string(),
    });

    match command {
        Commands::Watch { interval, page } => {
            let mut config = load_config(&server)?;
            if let Some(secs) = interval {
                config::validate_refresh_interval(secs)?;
                config.refresh_interval_secs = secs;
            }
            commands::watch::run(config, &page).await
        }
        Commands::Snapshot { json } => {
            let config = load_config(&server)?;
            commands::snapshot::run(&config, json).await
        }
        Commands::Health => {
            let config = load_config(&server)?;
            commands::health::run(&config).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
