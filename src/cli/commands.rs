//! Command implementations for the CLI

use crate::{
    cli::Command,
    config::Config,
    core::{BringUp, LoadGenerator},
    error::OpsError,
};
use anyhow::Context;
use tracing::{info, instrument};

/// Execute the appropriate command based on CLI arguments
#[instrument(skip(config))]
pub fn execute_command(config: &Config, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Load { .. } => execute_load_command(config),
        Command::Up { .. } => execute_up_command(config),
    }
}

/// Map a command failure to the process exit code.
///
/// Structured errors carry their own mapping (no kubectl context is 1, a
/// failed port-forward is 2); anything else exits 1.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    error.downcast_ref::<OpsError>().map_or(1, OpsError::exit_code)
}

/// Execute the load command
#[instrument(skip(config))]
fn execute_load_command(config: &Config) -> anyhow::Result<()> {
    info!("Generating load for {}s...", config.load.duration_secs);

    let generator = LoadGenerator::new(config);
    generator.run().context("Load generation failed")?;

    info!("Load generation completed");
    Ok(())
}

/// Execute the up command
#[instrument(skip(config))]
fn execute_up_command(config: &Config) -> anyhow::Result<()> {
    info!(
        "Bringing up namespace {} from {}",
        config.cluster.namespace,
        config.bringup.manifest_dir.display()
    );

    let mut bringup = BringUp::new(config);
    bringup.run()?;

    info!("Bring-up session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_for_plain_error() {
        let err = anyhow::anyhow!("something unrelated");
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn test_exit_code_for_missing_context() {
        let err = anyhow::Error::from(OpsError::NoContext);
        assert_eq!(exit_code_for(&err), 1);
    }

    #[test]
    fn test_exit_code_for_failed_port_forward() {
        let err = anyhow::Error::from(OpsError::port_forward("controller", "boom"));
        assert_eq!(exit_code_for(&err), 2);
    }
}
