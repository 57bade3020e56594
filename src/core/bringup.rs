//! Cluster bring-up and teardown
//!
//! Applies the manifest set, waits for readiness, holds one port-forward per
//! service open, and deletes the namespace on the way out. Child processes
//! are stopped gracefully first (interrupt, then terminate, then kill), each
//! step best effort with a short polling window.

use crate::config::{BringupConfig, Config, Forward};
use crate::core::kubectl::Kubectl;
use crate::error::{OpsError, Result};
use crate::utils::net::pick_port;
use crate::utils::term::QuitWatcher;
use std::io::Read;
use std::process::Child;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Delay after spawning a port-forward before checking it survived
const SPAWN_GRACE: Duration = Duration::from_millis(400);

/// Supervision poll cadence
const SUPERVISE_TICK: Duration = Duration::from_millis(150);

/// Polling window after each stop signal: 30 ticks of 100ms
const STOP_POLLS: u32 = 30;
const STOP_TICK: Duration = Duration::from_millis(100);

#[cfg(unix)]
const SIGINT: i32 = 2;
#[cfg(unix)]
const SIGTERM: i32 = 15;

/// A running port-forward child and where it listens
struct ForwardChild {
    service: String,
    local_port: u16,
    child: Child,
}

/// Brings the demo cluster up and tears it down again
pub struct BringUp {
    bringup: BringupConfig,
    kubectl: Kubectl,
}

impl BringUp {
    /// Create a new bring-up driver from the full configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            bringup: config.bringup.clone(),
            kubectl: Kubectl::new(config.cluster.clone(), config.debug),
        }
    }

    /// Run bring-up to completion: apply, wait, forward, supervise, tear down
    #[instrument(skip(self))]
    pub fn run(&mut self) -> Result<()> {
        let context = self.kubectl.current_context()?;
        println!("context: {context}");

        if self.bringup.reset {
            self.kubectl.delete_namespace();
            self.wait_namespace_gone();
        }

        if self.bringup.apply {
            self.apply_all()?;
        }

        if self.bringup.wait {
            self.kubectl.wait_ready(self.bringup.wait_timeout_secs)?;
        }

        let mut children = self.start_forwards()?;

        println!("\nport-forward up (press q then Enter to stop + delete namespace):");
        for fwd in &children {
            println!("  {}: http://localhost:{}", fwd.service, fwd.local_port);
        }

        self.supervise(&mut children);

        println!("\nstopping port-forward...");
        for fwd in &mut children {
            self.stop_forward(fwd);
        }

        println!("deleting namespace...");
        self.kubectl.delete_namespace();
        if self.wait_namespace_gone() {
            println!("done.");
        } else {
            println!("namespace deletion still in progress (check: kubectl get ns)");
        }

        Ok(())
    }

    /// Apply the manifest set in order, skipping files that don't exist
    fn apply_all(&self) -> Result<()> {
        for name in &self.bringup.manifests {
            let path = self.bringup.manifest_dir.join(name);
            if path.exists() {
                self.kubectl.apply(&path)?;
            } else {
                info!("missing: {}", path.display());
            }
        }
        Ok(())
    }

    /// Start one port-forward per configured service.
    ///
    /// A child that dies within the spawn grace period fails the whole
    /// bring-up: already-started forwards are stopped and the error carries
    /// whatever the dead child printed.
    fn start_forwards(&self) -> Result<Vec<ForwardChild>> {
        let mut children: Vec<ForwardChild> = Vec::with_capacity(self.bringup.forwards.len());

        for Forward {
            service,
            preferred_local_port,
        } in &self.bringup.forwards
        {
            let service_port = self.kubectl.service_port(service)?;
            let local_port = pick_port(*preferred_local_port)?;

            println!("starting port-forward: {service}  localhost:{local_port} -> {service_port}");

            let piped = !self.separate_windows();
            let mut child =
                self.kubectl
                    .spawn_port_forward(service, local_port, service_port, piped)?;

            thread::sleep(SPAWN_GRACE);

            if let Ok(Some(_)) = child.try_wait() {
                let output = drain_output(&mut child);
                println!("port-forward failed for {service}\n{output}");
                for fwd in &mut children {
                    self.stop_forward(fwd);
                }
                return Err(OpsError::port_forward(service, output));
            }

            children.push(ForwardChild {
                service: service.clone(),
                local_port,
                child,
            });
        }

        Ok(children)
    }

    /// Block until a child dies or the user asks to quit
    fn supervise(&self, children: &mut [ForwardChild]) {
        let quit = QuitWatcher::spawn();

        loop {
            for fwd in children.iter_mut() {
                if let Ok(Some(_)) = fwd.child.try_wait() {
                    println!("\nport-forward died: {}", fwd.service);
                    return;
                }
            }

            if quit.quit_requested() {
                return;
            }

            thread::sleep(SUPERVISE_TICK);
        }
    }

    /// Stop a port-forward: interrupt, then terminate, then kill
    fn stop_forward(&self, fwd: &mut ForwardChild) {
        if matches!(fwd.child.try_wait(), Ok(Some(_))) {
            return;
        }

        debug!("stopping port-forward for {}", fwd.service);

        #[cfg(unix)]
        {
            self.kubectl.signal_child(fwd.child.id(), SIGINT);
            if wait_for_exit(&mut fwd.child) {
                return;
            }

            self.kubectl.signal_child(fwd.child.id(), SIGTERM);
            if wait_for_exit(&mut fwd.child) {
                return;
            }
        }

        if let Err(e) = fwd.child.kill() {
            warn!("Failed to kill port-forward for {}: {}", fwd.service, e);
        }
        let _ = fwd.child.wait();
    }

    /// Poll `kubectl get ns` until the namespace disappears or time runs out
    fn wait_namespace_gone(&self) -> bool {
        for _ in 0..self.bringup.ns_gone_timeout_secs {
            match self.kubectl.namespace_listed() {
                Ok(false) => return true,
                Ok(true) => {}
                Err(e) => warn!("Could not list namespaces: {}", e),
            }
            thread::sleep(Duration::from_secs(1));
        }
        false
    }

    fn separate_windows(&self) -> bool {
        // only meaningful on Windows, where the forward gets its own console
        cfg!(windows) && self.bringup.pf_windows
    }
}

/// Poll a child for exit over the stop window
fn wait_for_exit(child: &mut Child) -> bool {
    for _ in 0..STOP_POLLS {
        if matches!(child.try_wait(), Ok(Some(_))) {
            return true;
        }
        thread::sleep(STOP_TICK);
    }
    false
}

/// Read whatever a dead child left on its pipes
fn drain_output(child: &mut Child) -> String {
    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_string(&mut output);
    }
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut output);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ProcessRunner;
    use std::io::Write;

    fn test_config(kubectl: &str) -> Config {
        let mut config = Config::default();
        config.cluster.kubectl = kubectl.to_string();
        // keep teardown polling snappy in tests
        config.bringup.ns_gone_timeout_secs = 2;
        config
    }

    #[test]
    fn test_apply_all_skips_missing_manifests() {
        // `true` exits 0 whatever the arguments, standing in for kubectl
        let mut config = test_config("true");
        let dir = tempfile::tempdir().unwrap();
        config.bringup.manifest_dir = dir.path().to_path_buf();

        let mut present = std::fs::File::create(dir.path().join("namespace.yaml")).unwrap();
        writeln!(present, "apiVersion: v1").unwrap();

        let bringup = BringUp::new(&config);
        // one manifest exists and "applies", three are skipped
        assert!(bringup.apply_all().is_ok());
    }

    #[test]
    fn test_apply_all_propagates_apply_failure() {
        let mut config = test_config("false");
        let dir = tempfile::tempdir().unwrap();
        config.bringup.manifest_dir = dir.path().to_path_buf();
        std::fs::File::create(dir.path().join("namespace.yaml")).unwrap();

        let bringup = BringUp::new(&config);
        assert!(bringup.apply_all().is_err());
    }

    #[test]
    fn test_wait_namespace_gone_when_absent() {
        // `echo get ns` output never contains "reactor-monitor"
        let config = test_config("echo");
        let bringup = BringUp::new(&config);
        assert!(bringup.wait_namespace_gone());
    }

    #[test]
    fn test_stop_forward_terminates_live_child() {
        let config = test_config("true");
        let bringup = BringUp::new(&config);

        let runner = ProcessRunner::new(false);
        let child = runner.spawn("sleep", &["30"], true).unwrap();
        let mut fwd = ForwardChild {
            service: "archiver".to_string(),
            local_port: 8082,
            child,
        };

        bringup.stop_forward(&mut fwd);
        assert!(matches!(fwd.child.try_wait(), Ok(Some(_))));
    }

    #[test]
    fn test_drain_output_reads_pipes() {
        let runner = ProcessRunner::new(false);
        let mut child = runner
            .spawn("sh", &["-c", "echo out; echo err >&2"], true)
            .unwrap();
        let _ = child.wait();

        let output = drain_output(&mut child);
        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }
}
