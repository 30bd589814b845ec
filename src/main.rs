//! HTTP/1.x Forward Proxy
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                  FORWARD PROXY                     │
//!                         │                                                    │
//!   Client Request        │  ┌──────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ──────────────────────┼─▶│   net    │──▶│ http: line │──▶│ http: head  │  │
//!                         │  │ listener │   │   reader   │   │ normalizer  │  │
//!                         │  └──────────┘   └────────────┘   └──────┬──────┘  │
//!                         │                                         │         │
//!                         │                                         ▼         │
//!   Client Response       │  ┌──────────┐   ┌────────────┐   ┌─────────────┐  │
//!   ◀─────────────────────┼──│  relay   │◀──│  upstream  │◀──│    proxy    │  │
//!                         │  │          │   │  connector │   │orchestrator │  │
//!                         │  └──────────┘   └────────────┘   └─────────────┘  │
//!                         │                                                    │
//!                         │  config · observability · resilience · lifecycle   │
//!                         └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use forward_proxy::config::loader::load_config;
use forward_proxy::config::ProxyConfig;
use forward_proxy::lifecycle::startup;
use forward_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "forward-proxy", version)]
#[command(about = "HTTP/1.x forward proxy", long_about = None)]
struct Cli {
    /// Port to listen on
    port: u16,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init() {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }
    tracing::info!("logging system initialized");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            tracing::error!(reason = %e.kind(), "usage: forward-proxy <PORT> [--config <FILE>]");
            return ExitCode::FAILURE;
        }
    };

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to load configuration");
                return ExitCode::FAILURE;
            }
        },
        None => ProxyConfig::default(),
    };
    config.listener.port = cli.port;

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        max_connections = config.listener.max_connections,
        connect_timeout_secs = config.timeouts.connect_secs,
        idle_timeout_secs = config.timeouts.idle_secs,
        "Configuration loaded"
    );

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy failed");
            ExitCode::FAILURE
        }
    }
}
