//! HPA load generation
//!
//! Drives CPU or HTTP load against the demo deployment while a poll loop
//! prints HPA status and replica counts, so the autoscaler's reaction can be
//! watched live. Coordination is deliberately loose: worker threads share a
//! deadline and an atomic done flag, nothing more.

use crate::config::{Config, LoadConfig, Mode};
use crate::core::kubectl::Kubectl;
use crate::error::{OpsError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// User agent sent by the HTTP load workers
const USER_AGENT: &str = "reactor-ops";

/// Per-request timeout for the HTTP load workers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Load generator for the demo deployment
pub struct LoadGenerator {
    load: LoadConfig,
    kubectl: Kubectl,
}

impl LoadGenerator {
    /// Create a new load generator from the full configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            load: config.load.clone(),
            kubectl: Kubectl::new(config.cluster.clone(), config.debug),
        }
    }

    /// Run the configured load scenario to completion
    #[instrument(skip(self))]
    pub fn run(&self) -> Result<()> {
        println!("namespace: {}", self.kubectl.namespace());
        println!("deploy: {}", self.load.deploy);
        println!("hpa: {}", self.load.hpa);
        println!("replicas (before): {}", self.kubectl.replicas(&self.load.deploy)?);
        println!("{}", self.kubectl.hpa_line(&self.load.hpa)?);

        let stop_at = Instant::now() + Duration::from_secs(self.load.duration_secs);

        match self.load.mode {
            Mode::Exec => self.run_exec(stop_at)?,
            Mode::Http => self.run_http(stop_at)?,
        }

        println!("\nAFTER:");
        println!("{}", self.kubectl.hpa_line(&self.load.hpa)?);
        println!("replicas (after): {}", self.kubectl.replicas(&self.load.deploy)?);
        println!("Note: scale-down usually takes 1-3 minutes after load stops.");

        Ok(())
    }

    /// CPU-burn mode: busy-spin a shell inside the first pod of the deployment
    fn run_exec(&self, stop_at: Instant) -> Result<()> {
        let pod = self.kubectl.first_pod_for(&self.load.deploy)?;
        println!("[exec] pod: {pod}");

        let done = Arc::new(AtomicBool::new(false));
        let done_flag = Arc::clone(&done);
        let worker_kubectl = self.kubectl.clone();
        let duration = self.load.duration_secs;

        let handle = thread::spawn(move || {
            if let Err(e) = worker_kubectl.exec_cpu_burn(&pod, duration) {
                warn!("CPU burn exec ended with an error: {}", e);
            }
            done_flag.store(true, Ordering::Relaxed);
        });

        while Instant::now() < stop_at && !done.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(self.load.interval_secs));
            self.print_status()?;
        }

        if handle.join().is_err() {
            warn!("CPU burn thread panicked");
        }
        Ok(())
    }

    /// HTTP mode: a pool of blocking workers hammers the endpoint until the
    /// deadline, counting successful responses
    fn run_http(&self, stop_at: Instant) -> Result<()> {
        println!(
            "[http] {} workers -> {}",
            self.load.concurrency, self.load.url
        );

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| OpsError::config(format!("Failed to build HTTP client: {e}")))?;

        let handles: Vec<JoinHandle<u64>> = (0..self.load.concurrency)
            .map(|worker| {
                let client = client.clone();
                let url = self.load.url.clone();
                thread::spawn(move || {
                    let count = http_worker(&client, &url, stop_at);
                    debug!("worker {} made {} successful requests", worker, count);
                    count
                })
            })
            .collect();

        while Instant::now() < stop_at {
            thread::sleep(Duration::from_secs(self.load.interval_secs));
            self.print_status()?;
        }

        let mut total: u64 = 0;
        for handle in handles {
            total += handle.join().unwrap_or(0);
        }

        info!("HTTP load finished");
        println!("approx requests: {total}");
        Ok(())
    }

    /// One status snapshot: the HPA wide line plus the replica count
    fn print_status(&self) -> Result<()> {
        println!("\n{}", self.kubectl.hpa_line(&self.load.hpa)?);
        println!("replicas: {}", self.kubectl.replicas(&self.load.deploy)?);
        Ok(())
    }
}

/// Issue GETs until the deadline, swallowing failures
fn http_worker(client: &reqwest::blocking::Client, url: &str, stop_at: Instant) -> u64 {
    let mut ok = 0;
    while Instant::now() < stop_at {
        match client.get(url).send() {
            Ok(resp) if resp.status().is_success() => {
                // only a few bytes are read, the body is irrelevant
                let _ = resp.bytes();
                ok += 1;
            }
            Ok(_) | Err(_) => {}
        }
    }
    ok
}
