use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supplier_admin::cli::{run_command, Cli};
use supplier_admin::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Flag wins, then the config file; a broken file is reported by the command itself
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| Config::load(&cli.config).ok().map(|c| c.logging.level))
        .unwrap_or_else(|| "info".to_string());

    // Logs go to stderr so tables on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("supplier-admin v{}", env!("CARGO_PKG_VERSION"));

    run_command(&cli).await
}
