//! Error types for the operations CLI
//!
//! Provides structured error handling with context and proper error chains.
//! `OpsError` also owns the process exit-code mapping for the `up` command.

use thiserror::Error;

/// Main error type for the operations CLI
#[derive(Error, Debug)]
pub enum OpsError {
    /// No active kubectl context is configured
    #[error("kubectl context not set")]
    NoContext,

    /// A deployment has no matchLabels selector to resolve pods with
    #[error("Deployment '{deploy}' has no matchLabels selector")]
    MissingSelector { deploy: String },

    /// No pods matched a deployment's selector
    #[error("No pods found for deployment '{deploy}' (selector: {selector})")]
    NoPods { deploy: String, selector: String },

    /// A service was missing or had an unusable port list
    #[error("Service error: {message}")]
    Service { service: String, message: String },

    /// No free local port was found near the preferred one
    #[error("No free local port near {preferred}")]
    NoFreePort { preferred: u16 },

    /// A port-forward child died right after being spawned
    #[error("port-forward failed for {service}")]
    PortForward { service: String, output: String },

    /// Process execution errors
    #[error("Process error: {command} failed")]
    Process {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failures decoding kubectl's JSON output
    #[error("Failed to parse kubectl output for {what}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl OpsError {
    /// Create a new service error
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a new port-forward startup error
    pub fn port_forward(service: impl Into<String>, output: impl Into<String>) -> Self {
        Self::PortForward {
            service: service.into(),
            output: output.into(),
        }
    }

    /// Create a new process error
    pub fn process(
        command: impl Into<String>,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::Process {
            command: command.into(),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            source: None,
        }
    }

    /// Create a new JSON decoding error
    pub fn json(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            what: what.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Process exit code this error maps to.
    ///
    /// The `up` command contract: 1 when no kubectl context is active,
    /// 2 when a port-forward fails to start, 1 for everything else.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::PortForward { .. } => 2,
            _ => 1,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OpsError>;
