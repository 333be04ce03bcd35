use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use hostwatch::api::{self, AppState};
use hostwatch::config::{self, Config, load_config, load_config_from_path};
use hostwatch::logging;

#[derive(Parser)]
#[command(
    name = "hostwatch",
    about = "Host telemetry over HTTP: CPU, memory, disk, network and processes"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init_tracing(&config.logging)?;

    match cli.config.clone().or_else(config::config_path) {
        Some(path) => tracing::info!(path = %path.display(), "configuration"),
        None => tracing::info!("no configuration directory, using defaults"),
    }
    tracing::debug!(?config, "effective configuration");

    let state = Arc::new(AppState::from_config(&config));
    api::serve(&config.server, state).await
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    config
}
