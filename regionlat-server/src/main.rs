use clap::Parser;
use regionlat_common::{RegionLatError, DEFAULT_THRESHOLD_MS};
use regionlat_server::config::{DEFAULT_ADDRESS, DEFAULT_DATASET_PATH};
use regionlat_server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "regionlat-server", about = "Per-region latency/uptime query service")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "REGIONLAT_ADDRESS", default_value = DEFAULT_ADDRESS)]
    address: SocketAddr,

    /// Path to the JSON telemetry dataset.
    #[arg(long, env = "REGIONLAT_DATASET", default_value = DEFAULT_DATASET_PATH)]
    dataset: PathBuf,

    /// Threshold (ms) used by `GET /latency` when the query omits one.
    #[arg(long, env = "REGIONLAT_DEFAULT_THRESHOLD_MS", default_value_t = DEFAULT_THRESHOLD_MS)]
    default_threshold_ms: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if !args.default_threshold_ms.is_finite() {
        return Err(RegionLatError::InvalidThreshold.into());
    }

    let config = ServerConfig {
        address: args.address,
        dataset: args.dataset,
        default_threshold_ms: args.default_threshold_ms,
    };

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(config).run(ready_tx).await?;
    Ok(())
}
