//! Command-line argument parsing and validation

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Operations CLI for the reactor-monitor demo cluster
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "reactor-ops")]
pub struct Args {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// How the load generator stresses the target deployment
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// Busy-spin inside the first pod of the deployment via kubectl exec
    Exec,
    /// Hammer an HTTP endpoint with a pool of blocking workers
    Http,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate load against the cluster and watch the HPA react
    Load {
        /// Load generation mode
        #[arg(long, value_enum, default_value = "exec")]
        mode: LoadMode,

        /// How long to generate load, in seconds
        #[arg(long, default_value_t = 90)]
        duration: u64,

        /// Status poll interval, in seconds
        #[arg(long, default_value_t = 5)]
        interval: u64,

        /// Target deployment name
        #[arg(long, default_value = "controller")]
        deploy: String,

        /// HPA name to watch
        #[arg(long, default_value = "controller-hpa")]
        hpa: String,

        /// Target URL for http mode
        #[arg(long, default_value = "http://localhost:8083/health/live")]
        url: String,

        /// Number of HTTP worker threads for http mode
        #[arg(long, default_value_t = 60)]
        concurrency: usize,
    },

    /// Bring the demo cluster up, hold port-forwards open, tear down on exit
    Up {
        /// Delete the namespace first
        #[arg(long)]
        reset: bool,

        /// Skip kubectl apply
        #[arg(long)]
        no_apply: bool,

        /// Skip waiting for pods to become ready
        #[arg(long)]
        no_wait: bool,

        /// Seconds for kubectl wait
        #[arg(long, default_value_t = 420)]
        timeout: u64,

        /// Open port-forwards in separate console windows (Windows only)
        #[arg(long)]
        pf_windows: bool,

        /// Directory containing the manifest set
        #[arg(long, default_value = "infra/k8s")]
        manifest_dir: PathBuf,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_defaults() {
        let args = Args::try_parse_from(["reactor-ops", "load"]).unwrap();
        assert!(!args.debug);
        match args.command {
            Command::Load {
                mode,
                duration,
                interval,
                deploy,
                hpa,
                concurrency,
                ..
            } => {
                assert_eq!(mode, LoadMode::Exec);
                assert_eq!(duration, 90);
                assert_eq!(interval, 5);
                assert_eq!(deploy, "controller");
                assert_eq!(hpa, "controller-hpa");
                assert_eq!(concurrency, 60);
            }
            Command::Up { .. } => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_parse_load_http_mode() {
        let args = Args::try_parse_from([
            "reactor-ops",
            "load",
            "--mode",
            "http",
            "--url",
            "http://localhost:9999/ping",
            "--concurrency",
            "8",
        ])
        .unwrap();
        match args.command {
            Command::Load {
                mode,
                url,
                concurrency,
                ..
            } => {
                assert_eq!(mode, LoadMode::Http);
                assert_eq!(url, "http://localhost:9999/ping");
                assert_eq!(concurrency, 8);
            }
            Command::Up { .. } => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_parse_up_flags() {
        let args = Args::try_parse_from([
            "reactor-ops",
            "up",
            "--reset",
            "--no-wait",
            "--timeout",
            "60",
        ])
        .unwrap();
        match args.command {
            Command::Up {
                reset,
                no_apply,
                no_wait,
                timeout,
                pf_windows,
                ..
            } => {
                assert!(reset);
                assert!(!no_apply);
                assert!(no_wait);
                assert_eq!(timeout, 60);
                assert!(!pf_windows);
            }
            Command::Load { .. } => panic!("Expected Up command"),
        }
    }

    #[test]
    fn test_parse_debug_flag_is_global() {
        let args = Args::try_parse_from(["reactor-ops", "up", "--debug"]).unwrap();
        assert!(args.debug);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Args::try_parse_from(["reactor-ops", "load", "--mode", "fork"]).is_err());
    }
}
