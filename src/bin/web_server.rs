use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use cloudpulse::api::{self, AppState};
use cloudpulse::{CleanupSimulator, CloudPulseConfig, NotificationHub, ResourceCatalog};

#[derive(Parser)]
#[command(name = "web-server")]
#[command(about = "Serve the CloudPulse resource catalog and notification hub over HTTP")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the bind address from the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    info!("🚀 Starting CloudPulse Web Server");

    let config = CloudPulseConfig::load_or_default(&args.config);
    info!("⏱️ Visibility window: {:?}", config.hub.visibility_window());

    let hub = NotificationHub::new(&config.hub);
    let catalog = ResourceCatalog::standard();
    let simulator = Arc::new(CleanupSimulator::new(hub.clone(), &config.cleanup, &catalog));

    let cleanup_handle = {
        let simulator = Arc::clone(&simulator);
        let period = config.cleanup.tick_interval();
        tokio::spawn(async move { simulator.run(period).await })
    };

    let app = api::router(AppState {
        hub: hub.clone(),
        catalog,
        simulator,
    });

    let bind_address = args.bind.unwrap_or(config.server.bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("✅ Server running on http://{}", bind_address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    cleanup_handle.abort();
    hub.shutdown().await;
    info!("Server stopped");

    served?;
    Ok(())
}
