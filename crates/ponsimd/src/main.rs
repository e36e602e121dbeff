//! ponsimd entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pon_dataplane::{EgressSink, PonFabric};
use ponsimd::Config;

/// Initializes tracing/logging subsystem.
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(&config.log_filter);

    info!("--- Starting ponsimd ---");
    info!("Leaf devices: {}", config.leaf_count);

    // Until a frame-I/O front end is attached, egress traffic is only
    // logged.
    let egress: EgressSink = Box::new(|port, frame| {
        debug!(%port, frame = %frame.hex(), "egress");
    });
    let fabric = PonFabric::build(config.leaf_count, egress);

    for port in fabric.ports() {
        info!("Announcing global port {}", port);
    }
    info!("Fabric ready; awaiting flow installs and frames");

    // TODO: wire the tap-interface frame-I/O front end to fabric.ingress
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT, shutting down"),
        Err(err) => {
            error!("Failed to listen for ctrl-c: {}", err);
            return ExitCode::FAILURE;
        }
    }

    info!("ponsimd shutdown complete");
    ExitCode::SUCCESS
}
