//! Gateway entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use stream_gateway::config::load_or_default;
use stream_gateway::http::GatewayServer;
use stream_gateway::lifecycle::{signals, Shutdown};
use stream_gateway::observability::{logging, metrics};
use stream_gateway::services::{HttpInference, MemoryBroker, MemoryStore};

#[derive(Parser)]
#[command(name = "stream-gateway")]
#[command(about = "Event-stream framing gateway for a streaming inference upstream")]
struct Cli {
    /// Path to a TOML config file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref())?;

    logging::init(&config.observability.log_level);
    tracing::info!("stream-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        topic_filter = %config.gate.topic_filter,
        "configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_bind_address {
        metrics::install_exporter(addr.parse()?)?;
        tracing::info!(address = %addr, "metrics exporter listening");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_ctrl_c(Arc::clone(&shutdown));

    // The broker and store are in-process stand-ins wired behind the
    // service traits; a deployment swaps in real transports here.
    let inference = Arc::new(HttpInference::new(config.upstream.base_url.clone()));
    let store = Arc::new(MemoryStore::new());
    let broker = Arc::new(MemoryBroker::new());

    let server = GatewayServer::new(config, inference, store, broker);
    server.run(listener, shutdown.subscribe()).await?;

    Ok(())
}
