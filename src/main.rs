use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use cloudpulse::{
    CleanupSimulator, CloudPulseConfig, HubEvent, NotificationHub, ResourceCatalog, Severity,
};

#[derive(Parser)]
#[command(name = "cloudpulse")]
#[command(about = "Drive the CloudPulse notification hub with sample events")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of cleanup ticks to simulate
    #[arg(short, long, default_value = "3")]
    ticks: u32,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

async fn send_sample_notifications(hub: &NotificationHub) {
    hub.notify("Disk full", Some(Severity::Error)).await;
    hub.notify("High memory usage detected (85%)", Some(Severity::Warning))
        .await;
    hub.notify("Monthly cost report is ready", None).await;
    hub.notify_str("Backup completed", "success").await;
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("🚀 Starting CloudPulse notification demo...");

    let config = CloudPulseConfig::load_or_default(&args.config);
    let hub = NotificationHub::new(&config.hub);

    let mut events = hub.subscribe();
    let _listener = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(HubEvent::Notified(record)) => {
                    info!("🔔 [{}] {} ({})", record.severity, record.message, record.id)
                }
                Ok(HubEvent::Dismissed(id)) => info!("👋 Dismissed {}", id),
                Ok(HubEvent::Expired(id)) => info!("⌛ Expired {}", id),
                Ok(HubEvent::Purged { pattern, removed }) => {
                    info!("🧹 Purged {} record(s) matching '{}'", removed, pattern)
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event listener lagged, skipped {} events", skipped)
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    send_sample_notifications(&hub).await;

    let simulator = CleanupSimulator::new(hub.clone(), &config.cleanup, &ResourceCatalog::standard());
    for _ in 0..args.ticks {
        simulator.tick().await;
    }

    if let Some(project) = simulator.projects().await.into_iter().next() {
        if let Some(resource) = project.resources.first() {
            let resource = resource.clone();
            simulator.remove_now(&project.project, &resource.id).await;
            simulator
                .forget(&project.project, &resource.name, &resource.resource_type)
                .await;
        }
    }

    info!(
        "📊 Active: {}, history: {}",
        hub.list_active().await.len(),
        hub.unread_count().await
    );

    // Let the visibility window run out.
    tokio::time::sleep(hub.visibility_window() + Duration::from_millis(100)).await;

    info!(
        "📊 Active: {}, history: {}",
        hub.list_active().await.len(),
        hub.unread_count().await
    );

    hub.shutdown().await;
    info!("✅ Demo completed successfully");

    Ok(())
}
