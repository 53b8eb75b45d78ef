//! LinkShield - HDCP link authentication supervision for Linux DRM displays
//!
//! Opens a DRM device node, engages HDCP on its display link, and keeps
//! supervising the link (re-verifying and re-authenticating as needed)
//! until interrupted.

use anyhow::Result;
use clap::Parser;
use linkshield_core::Config;
use linkshield_drm::{DrmLink, DrmLinkOptions, DEFAULT_DEVICE};
use linkshield_hdcp::HdcpController;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// LinkShield - Supervise HDCP authentication on a display link
#[derive(Parser, Debug)]
#[command(name = "linkshield")]
#[command(version, about, long_about = None)]
struct Args {
    /// DRM device node to supervise
    #[arg(short, long, default_value = DEFAULT_DEVICE)]
    device: String,

    /// Monitored mode: stream per-cycle status updates instead of
    /// blocking on the first authentication outcome
    #[arg(short, long)]
    monitor: bool,

    /// Forbid monitored starts (platform kill switch)
    #[arg(long)]
    no_monitoring: bool,

    /// Quiesce display IED around authentication runs
    #[arg(long)]
    ied_quiesce: bool,

    /// Seconds to wait for the first authentication outcome
    #[arg(short, long, default_value = "5")]
    timeout: u64,

    /// Enable/verify attempts per authentication run
    #[arg(short, long, default_value = "20")]
    retry_budget: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("LinkShield v{}", env!("CARGO_PKG_VERSION"));

    // Create configuration
    let config = Config::new()
        .with_authentication_timeout(Duration::from_secs(args.timeout))
        .with_retry_budget(args.retry_budget)
        .with_monitoring_enabled(!args.no_monitoring);

    let options = DrmLinkOptions {
        ied_quiesce: args.ied_quiesce,
    };
    let link = Arc::new(DrmLink::open_with_options(&args.device, options)?);
    let controller = HdcpController::new(link, config);

    if args.monitor {
        run_monitored(&controller, &args.device).await;
    } else {
        run_blocking(&controller, &args.device).await;
    }

    controller.stop().await;
    info!("Goodbye!");
    Ok(())
}

/// Monitored mode: log every status update until Ctrl-C
async fn run_monitored(controller: &HdcpController, device: &str) {
    let (updates_tx, mut updates_rx) = mpsc::channel(16);
    if !controller.start_monitored(updates_tx).await {
        warn!("Monitored supervision refused for {}", device);
        return;
    }

    info!("Supervising {} (monitored); press Ctrl+C to stop", device);
    loop {
        tokio::select! {
            update = updates_rx.recv() => match update {
                Some(status) => {
                    if status.authenticated {
                        info!("Cycle {}: link authenticated", status.cycle);
                    } else {
                        warn!("Cycle {}: link not authenticated", status.cycle);
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }
}

/// Default mode: block for the first outcome, then supervise quietly
async fn run_blocking(controller: &HdcpController, device: &str) {
    if controller.start().await {
        info!("Link authenticated");
    } else {
        warn!("Link not authenticated; supervision keeps retrying");
    }

    info!("Supervising {}; press Ctrl+C to stop", device);
    tokio::signal::ctrl_c().await.ok();
    info!("Shutting down...");
}
