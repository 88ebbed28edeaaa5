//! Token ring binary
//!
//! Usage: `tokenring [size]`
//!
//! Builds a ring of `size` participants (default 3), asks for a message and a
//! destination, and circulates the token until Ctrl-C.

use std::sync::Arc;

use tokenring_cli::{parse_ring_size, ConsoleSource};
use tokenring_protocol::{Ring, RingConfig, RingReport, TracingLog};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tokenring=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let arg = std::env::args().nth(1);
    let size = parse_ring_size(arg.as_deref());
    let config = RingConfig::from_env(size);

    // Exit explicitly: a pending stdin read would otherwise hold the runtime open.
    match run(config).await {
        Ok(report) => {
            info!(
                size = report.size.get(),
                forwards = report.forwards(),
                deliveries = report.deliveries(),
                "Token ring shut down"
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("Token ring failed: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(config: RingConfig) -> tokenring_protocol::Result<RingReport> {
    let ring = Ring::build(config, Arc::new(TracingLog))?;

    let interrupt = ring.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                interrupt.trigger();
            }
            Err(e) => warn!("Cannot listen for interrupt: {}", e),
        }
    });

    ring.run(ConsoleSource::stdio()).await
}
