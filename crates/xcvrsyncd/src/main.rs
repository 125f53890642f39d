//! xcvrsyncd daemon entry point.
//!
//! Initializes logging, loads configuration, builds the shared
//! transceiver context, and runs the change-event loop, publishing
//! hot-plug transitions to the log for the platform layer.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sonic_xcvr_common::MockPltfmMgr;
use sonic_xcvrsyncd::{XcvrConfig, XcvrContext};

/// Per-iteration wait budget so the shutdown flag is observed (matches
/// the cfgmgr SELECT_TIMEOUT).
const WAIT_TIMEOUT_MS: i64 = 1000;

/// Port count served by the in-memory platform manager stand-in.
const STANDALONE_PORT_COUNT: u32 = 32;

/// Initialize tracing/logging.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Setup signal handlers and return atomic flag for shutdown signaling
fn setup_signal_handlers() -> Arc<AtomicBool> {
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received SIGTERM/SIGINT");
            shutdown_flag_clone.store(true, Ordering::Relaxed);
        }
    });

    shutdown_flag
}

/// Main change-event loop.
async fn run_daemon(ctx: Arc<XcvrContext>) -> anyhow::Result<()> {
    let shutdown = setup_signal_handlers();

    info!("Starting change-event loop with {}ms wait budget", WAIT_TIMEOUT_MS);

    while !shutdown.load(Ordering::Relaxed) {
        let (ready, changes) = ctx.wait_for_change(WAIT_TIMEOUT_MS).await;

        if !ready {
            debug!("Management service not ready yet");
            continue;
        }

        for (port, presence) in &changes {
            info!("Port {} presence changed to {}", port, presence.as_str());
        }
    }

    info!("Performing graceful shutdown");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    info!("--- Starting xcvrsyncd (Rust) ---");

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("XCVRSYNCD_CONF").ok())
        .unwrap_or_else(|| "/etc/sonic/xcvrsyncd.conf".to_string());

    let config = match XcvrConfig::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Management endpoint {}:{} (connect timeout {:?})",
        config.mgmt.host,
        config.mgmt.port,
        config.connect_timeout()
    );

    // In the production image this binds the vendor platform manager
    // RPC service; the in-memory manager stands in until that bridge
    // lands.
    let client = Arc::new(MockPltfmMgr::new(STANDALONE_PORT_COUNT));

    let ctx = match XcvrContext::new(client, config).await {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            error!("Failed to initialize transceiver context: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_daemon(ctx).await {
        Ok(()) => {
            info!("xcvrsyncd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("xcvrsyncd error: {}", e);
            ExitCode::FAILURE
        }
    }
}
