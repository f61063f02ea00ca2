//! modemwatchd — connectivity watchdog for an LTE gateway.
//!
//! Pings one or more targets through the gateway and, when all of them
//! stay unreachable, reboots the gateway through its management API.
//!
//! # Usage
//!
//! ```text
//! modemwatchd http://192.168.8.1/ --username admin --password secret \
//!     --target-ips 8.8.8.8,1.1.1.1 --interval 10 --max-reboots 3
//! ```
//!
//! Every flag can also come from the environment (`MODEM_URL`,
//! `TARGET_IPS`, ...) or from a TOML file given with `--config`.

mod cli;
mod watchdog;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,modemwatchd=debug,modemwatch=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let settings = cli.settings()?;
    info!(?settings, "configuration loaded");

    watchdog::run(settings).await
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
