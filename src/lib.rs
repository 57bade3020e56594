//! # reactor-ops
//!
//! Operational CLI for the reactor-monitor demo cluster. Two commands:
//! a load generator that stresses a deployment (in-pod CPU burn or HTTP
//! hammering) while watching the HPA react, and a bring-up driver that
//! applies the manifest set, holds port-forwards open, and tears the
//! namespace down on exit.
//!
//! All cluster work is delegated to the `kubectl` client, invoked as a
//! subprocess and parsed as text/JSON. This crate is orchestration glue.
//!
//! ## Example
//!
//! ```no_run
//! use reactor_ops::{config::Config, core::LoadGenerator};
//!
//! let config = Config::default();
//! let generator = LoadGenerator::new(&config);
//! generator.run()?;
//! # Ok::<(), reactor_ops::error::OpsError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
