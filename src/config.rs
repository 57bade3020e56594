//! Configuration management for the operations CLI
//!
//! Centralizes the fixed namespace/manifest/forward tables and the options
//! taken from the command line.

use crate::cli::{Args, Command, LoadMode};
use crate::error::OpsError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Cluster-level settings shared by both commands
    pub cluster: ClusterConfig,
    /// Load generator settings
    pub load: LoadConfig,
    /// Bring-up settings
    pub bringup: BringupConfig,
}

/// Cluster-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Namespace all demo resources live in
    pub namespace: String,
    /// kubectl binary to invoke
    pub kubectl: String,
}

/// Load generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Load generation mode
    pub mode: Mode,
    /// Load duration in seconds
    pub duration_secs: u64,
    /// Status poll interval in seconds
    pub interval_secs: u64,
    /// Target deployment
    pub deploy: String,
    /// HPA to watch
    pub hpa: String,
    /// Target URL for http mode
    pub url: String,
    /// HTTP worker thread count
    pub concurrency: usize,
}

/// Serializable mirror of the CLI's load mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Exec,
    Http,
}

/// A service to port-forward and its preferred local port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forward {
    pub service: String,
    pub preferred_local_port: u16,
}

/// Bring-up configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BringupConfig {
    /// Delete the namespace before applying
    pub reset: bool,
    /// Apply the manifest set
    pub apply: bool,
    /// Wait for pods to become ready
    pub wait: bool,
    /// Readiness wait timeout in seconds
    pub wait_timeout_secs: u64,
    /// Open port-forwards in separate console windows (Windows only)
    pub pf_windows: bool,
    /// Directory holding the manifest set
    pub manifest_dir: PathBuf,
    /// Manifest files applied in order
    pub manifests: Vec<String>,
    /// Services to forward, in startup order
    pub forwards: Vec<Forward>,
    /// Seconds to wait for namespace deletion to complete
    pub ns_gone_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            cluster: ClusterConfig::default(),
            load: LoadConfig::default(),
            bringup: BringupConfig::default(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: "reactor-monitor".to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Exec,
            duration_secs: 90,
            interval_secs: 5,
            deploy: "controller".to_string(),
            hpa: "controller-hpa".to_string(),
            url: "http://localhost:8083/health/live".to_string(),
            concurrency: 60,
        }
    }
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self {
            reset: false,
            apply: true,
            wait: true,
            wait_timeout_secs: 420,
            pf_windows: false,
            manifest_dir: PathBuf::from("infra/k8s"),
            manifests: vec![
                "namespace.yaml".to_string(),
                "platform.yaml".to_string(),
                "apps.yaml".to_string(),
                "hpa.yaml".to_string(),
            ],
            forwards: vec![
                Forward {
                    service: "sensor-manager".to_string(),
                    preferred_local_port: 8081,
                },
                Forward {
                    service: "archiver".to_string(),
                    preferred_local_port: 8082,
                },
                Forward {
                    service: "controller".to_string(),
                    preferred_local_port: 8083,
                },
            ],
            ns_gone_timeout_secs: 180,
        }
    }
}

impl From<LoadMode> for Mode {
    fn from(mode: LoadMode) -> Self {
        match mode {
            LoadMode::Exec => Self::Exec,
            LoadMode::Http => Self::Http,
        }
    }
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, OpsError> {
        let mut config = Self {
            debug: args.debug,
            ..Self::default()
        };

        match &args.command {
            Command::Load {
                mode,
                duration,
                interval,
                deploy,
                hpa,
                url,
                concurrency,
            } => {
                config.load.mode = (*mode).into();
                config.load.duration_secs = *duration;
                config.load.interval_secs = *interval;
                config.load.deploy = deploy.clone();
                config.load.hpa = hpa.clone();
                config.load.url = url.clone();
                config.load.concurrency = *concurrency;
            }
            Command::Up {
                reset,
                no_apply,
                no_wait,
                timeout,
                pf_windows,
                manifest_dir,
            } => {
                config.bringup.reset = *reset;
                config.bringup.apply = !no_apply;
                config.bringup.wait = !no_wait;
                config.bringup.wait_timeout_secs = *timeout;
                config.bringup.pf_windows = *pf_windows;
                config.bringup.manifest_dir = manifest_dir.clone();
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), OpsError> {
        if self.load.interval_secs == 0 {
            return Err(OpsError::validation("poll interval must be at least 1s"));
        }

        if self.load.concurrency == 0 {
            return Err(OpsError::validation("concurrency must be at least 1"));
        }

        if self.bringup.forwards.is_empty() {
            return Err(OpsError::validation("no services configured to forward"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_demo_layout() {
        let config = Config::default();
        assert_eq!(config.cluster.namespace, "reactor-monitor");
        assert_eq!(config.bringup.manifests.len(), 4);
        assert_eq!(config.bringup.forwards[2].service, "controller");
        assert_eq!(config.bringup.forwards[2].preferred_local_port, 8083);
    }

    #[test]
    fn test_from_args_load() {
        let args = Args::try_parse_from([
            "reactor-ops",
            "load",
            "--mode",
            "http",
            "--duration",
            "30",
            "--concurrency",
            "4",
        ])
        .unwrap();
        let config = Config::from_args(&args).unwrap();
        assert_eq!(config.load.mode, Mode::Http);
        assert_eq!(config.load.duration_secs, 30);
        assert_eq!(config.load.concurrency, 4);
        // untouched defaults survive
        assert_eq!(config.load.hpa, "controller-hpa");
    }

    #[test]
    fn test_from_args_up_inverts_skip_flags() {
        let args =
            Args::try_parse_from(["reactor-ops", "up", "--no-apply", "--no-wait"]).unwrap();
        let config = Config::from_args(&args).unwrap();
        assert!(!config.bringup.apply);
        assert!(!config.bringup.wait);
        assert!(!config.bringup.reset);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let args =
            Args::try_parse_from(["reactor-ops", "load", "--concurrency", "0"]).unwrap();
        assert!(Config::from_args(&args).is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args = Args::try_parse_from(["reactor-ops", "load", "--interval", "0"]).unwrap();
        assert!(Config::from_args(&args).is_err());
    }
}
