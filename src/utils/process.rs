//! Process execution utilities
//!
//! Provides safe process execution with proper error handling and logging.
//! Captured invocations merge stderr into stdout, matching how kubectl's
//! diagnostics end up interleaved with its tables on a terminal.

use crate::error::{OpsError, Result};
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, instrument, warn};

/// Utility for running external processes
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    debug: bool,
}

/// Result of a captured process execution
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status code
    pub exit_code: Option<i32>,
    /// Combined stdout + stderr
    pub output: String,
    /// Whether the process exited successfully
    pub success: bool,
}

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Run a command with arguments, inheriting stdout/stderr, failing on
    /// non-zero exit
    #[instrument(skip(self))]
    pub fn run_command(&self, command: &str, args: &[&str]) -> Result<()> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        if self.debug {
            debug!("Running command: {}", cmd_str);
        } else {
            info!("+ {}", cmd_str);
        }

        let status = Command::new(command)
            .args(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                OpsError::process(
                    cmd_str.clone(),
                    None,
                    String::new(),
                    format!("Failed to execute command: {e}"),
                )
            })?;

        if !status.success() {
            let exit_code = status.code();
            return Err(OpsError::process(
                cmd_str,
                exit_code,
                String::new(),
                format!("Command failed with exit code: {exit_code:?}"),
            ));
        }

        debug!("Command completed successfully");
        Ok(())
    }

    /// Run a command and capture its combined output, regardless of exit
    /// status.
    ///
    /// Spawn failures still error; a non-zero exit does not. Callers that
    /// care about the exit status check `ProcessOutput::success`.
    #[instrument(skip(self))]
    pub fn capture(&self, command: &str, args: &[&str]) -> Result<ProcessOutput> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        debug!("Capturing command output: {}", cmd_str);

        let output = Command::new(command)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                OpsError::process(
                    cmd_str.clone(),
                    None,
                    String::new(),
                    format!("Failed to execute command: {e}"),
                )
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let success = output.status.success();
        let exit_code = output.status.code();

        debug!(
            "Command finished: success={}, exit_code={:?}, output_len={}",
            success,
            exit_code,
            combined.len()
        );

        Ok(ProcessOutput {
            exit_code,
            output: combined,
            success,
        })
    }

    /// Spawn a long-running child with piped output
    #[instrument(skip(self))]
    pub fn spawn(&self, command: &str, args: &[&str], piped: bool) -> Result<Child> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        if self.debug {
            debug!("Spawning: {}", cmd_str);
        } else {
            info!("+ {}", cmd_str);
        }

        let mut cmd = Command::new(command);
        cmd.args(args);

        if piped {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NEW_PROCESS_GROUP, so CTRL_BREAK can be delivered later
            cmd.creation_flags(0x0000_0200);
        }

        cmd.spawn().map_err(|e| {
            OpsError::process(
                cmd_str,
                None,
                String::new(),
                format!("Failed to spawn command: {e}"),
            )
        })
    }

    /// Send a signal to a process by PID, best effort (Unix only)
    #[cfg(unix)]
    #[instrument(skip(self))]
    pub fn signal_process(&self, pid: u32, signal: i32) {
        debug!("Signalling process {} with signal {}", pid, signal);

        let result = Command::new("kill")
            .args([&format!("-{signal}"), &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if let Err(e) = result {
            warn!("Failed to signal process {}: {}", pid, e);
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(false)
    }
}
