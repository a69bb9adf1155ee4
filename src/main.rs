//! Command-line entry point: enumerate one bus through a gateway.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use buswire::{Bus, Enumerator, TcpGateway};

/// Scan a device bus and assign addresses to learn-mode devices.
#[derive(Parser, Debug)]
#[command(name = "buswire", version, about)]
struct Cli {
    /// Gateway endpoint exposing the raw bus, as host:port.
    endpoint: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let gateway = match TcpGateway::connect(&cli.endpoint).await {
        Ok(gateway) => gateway,
        Err(err) => {
            tracing::error!("cannot reach gateway {}: {err}", cli.endpoint);
            return ExitCode::from(3);
        }
    };

    let mut enumerator = Enumerator::new(Bus::new(gateway));
    match enumerator.run().await {
        // run() loops until the process is stopped, so Ok never happens;
        // keep the arm so the signature stays honest.
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("enumeration aborted: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
