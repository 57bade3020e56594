//! Thin wrapper around the kubectl client
//!
//! Every cluster interaction goes through here: the cluster owns all the hard
//! work (scheduling, readiness, autoscaling), this module just shapes the
//! command lines and extracts the few fields we need from kubectl's output.

use crate::config::ClusterConfig;
use crate::error::{OpsError, Result};
use crate::utils::ProcessRunner;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Child;
use tracing::{debug, instrument};

/// kubectl invocation helper bound to the demo namespace
#[derive(Debug, Clone)]
pub struct Kubectl {
    config: ClusterConfig,
    runner: ProcessRunner,
}

#[derive(Debug, Deserialize)]
struct DeploymentDoc {
    #[serde(default)]
    spec: DeploymentSpec,
}

#[derive(Debug, Default, Deserialize)]
struct DeploymentSpec {
    #[serde(default)]
    selector: LabelSelector,
}

#[derive(Debug, Default, Deserialize)]
struct LabelSelector {
    // BTreeMap keeps the rendered selector deterministic
    #[serde(rename = "matchLabels", default)]
    match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ServiceList {
    #[serde(default)]
    items: Vec<ServiceDoc>,
}

#[derive(Debug, Deserialize)]
struct ServiceDoc {
    #[serde(default)]
    metadata: ServiceMetadata,
    #[serde(default)]
    spec: ServiceSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceMetadata {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSpec {
    #[serde(default)]
    ports: Vec<ServicePort>,
}

#[derive(Debug, Deserialize)]
struct ServicePort {
    port: Option<u16>,
}

impl Kubectl {
    /// Create a new kubectl wrapper
    #[must_use]
    pub const fn new(config: ClusterConfig, debug: bool) -> Self {
        Self {
            config,
            runner: ProcessRunner::new(debug),
        }
    }

    /// Namespace all namespaced invocations target
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Resolve the active kubectl context, erroring when none is configured
    #[instrument(skip(self))]
    pub fn current_context(&self) -> Result<String> {
        let out = self
            .runner
            .capture(&self.config.kubectl, &["config", "current-context"])?;
        let ctx = out.output.trim().to_string();
        if ctx.is_empty() || !out.success {
            return Err(OpsError::NoContext);
        }
        Ok(ctx)
    }

    /// Current replica count of a deployment.
    ///
    /// Missing deployments, empty output, and warnings mixed into the stream
    /// all map to 0; status polling never aborts the run.
    #[instrument(skip(self))]
    pub fn replicas(&self, deploy: &str) -> Result<u64> {
        let out = self.capture_ns(&[
            "get",
            "deploy",
            deploy,
            "-o",
            "jsonpath={.status.replicas}",
        ])?;
        Ok(parse_replicas(&out))
    }

    /// The `get hpa -o wide` table line for an HPA, easiest to read raw
    #[instrument(skip(self))]
    pub fn hpa_line(&self, hpa: &str) -> Result<String> {
        let out = self.capture_ns(&["get", "hpa", hpa, "-o", "wide"])?;
        Ok(out.trim_end().to_string())
    }

    /// Label selector of a deployment, rendered as `k=v,k2=v2`
    #[instrument(skip(self))]
    pub fn deployment_selector(&self, deploy: &str) -> Result<String> {
        let out = self.capture_ns(&["get", "deploy", deploy, "-o", "json"])?;
        parse_selector(deploy, &out)
    }

    /// Name of the first pod matching a deployment's selector
    #[instrument(skip(self))]
    pub fn first_pod_for(&self, deploy: &str) -> Result<String> {
        let selector = self.deployment_selector(deploy)?;
        let out = self.capture_ns(&[
            "get",
            "pods",
            "-l",
            &selector,
            "-o",
            "jsonpath={.items[0].metadata.name}",
        ])?;
        let pod = out.trim().to_string();
        if pod.is_empty() {
            return Err(OpsError::NoPods {
                deploy: deploy.to_string(),
                selector,
            });
        }
        Ok(pod)
    }

    /// Cluster-side port of a named service
    #[instrument(skip(self))]
    pub fn service_port(&self, service: &str) -> Result<u16> {
        let out = self.capture_ns(&["get", "svc", "-o", "json"])?;
        parse_service_port(service, &self.config.namespace, &out)
    }

    /// Busy-spin a shell inside a pod for `duration_secs`, blocking until done
    #[instrument(skip(self))]
    pub fn exec_cpu_burn(&self, pod: &str, duration_secs: u64) -> Result<()> {
        let script = format!(
            "end=$((SECONDS+{duration_secs})); while [ $SECONDS -lt $end ]; do :; done"
        );
        // output is discarded, only completion matters
        self.capture_ns(&["exec", pod, "--", "sh", "-c", &script])?;
        Ok(())
    }

    /// Apply a manifest file, streaming kubectl's output to the terminal.
    /// Manifests carry their own namespace, so none is injected here.
    #[instrument(skip(self))]
    pub fn apply(&self, manifest: &Path) -> Result<()> {
        let path = manifest.to_string_lossy();
        self.run_plain(&["apply", "-f", &path])
    }

    /// Wait for every pod in the namespace to report Ready
    #[instrument(skip(self))]
    pub fn wait_ready(&self, timeout_secs: u64) -> Result<()> {
        let timeout = format!("--timeout={timeout_secs}s");
        self.run_ns(&["wait", "--for=condition=Ready", "pod", "--all", &timeout])
    }

    /// Delete the namespace, best effort
    #[instrument(skip(self))]
    pub fn delete_namespace(&self) {
        let result = self.run_plain(&[
            "delete",
            "namespace",
            self.config.namespace.as_str(),
            "--ignore-not-found=true",
        ]);
        if let Err(e) = result {
            debug!("Namespace deletion reported an error (ignored): {}", e);
        }
    }

    /// Whether the namespace still shows up in `kubectl get ns`
    #[instrument(skip(self))]
    pub fn namespace_listed(&self) -> Result<bool> {
        let out = self.runner.capture(&self.config.kubectl, &["get", "ns"])?;
        Ok(out.output.contains(&self.config.namespace))
    }

    /// Spawn a `kubectl port-forward` child for a service
    #[instrument(skip(self))]
    pub fn spawn_port_forward(
        &self,
        service: &str,
        local_port: u16,
        service_port: u16,
        piped: bool,
    ) -> Result<Child> {
        let target = format!("svc/{service}");
        let mapping = format!("{local_port}:{service_port}");
        self.runner.spawn(
            &self.config.kubectl,
            &[
                "port-forward",
                "-n",
                &self.config.namespace,
                &target,
                &mapping,
            ],
            piped,
        )
    }

    /// Best-effort interrupt of a child process (Unix)
    #[cfg(unix)]
    pub fn signal_child(&self, pid: u32, signal: i32) {
        self.runner.signal_process(pid, signal);
    }

    fn capture_ns(&self, args: &[&str]) -> Result<String> {
        let full = self.with_namespace(args);
        let refs: Vec<&str> = full.iter().map(String::as_str).collect();
        let out = self.runner.capture(&self.config.kubectl, &refs)?;
        Ok(out.output)
    }

    fn run_ns(&self, args: &[&str]) -> Result<()> {
        let full = self.with_namespace(args);
        let refs: Vec<&str> = full.iter().map(String::as_str).collect();
        self.runner.run_command(&self.config.kubectl, &refs)
    }

    /// Like `run_ns` but without injecting `-n` (cluster-level invocations)
    fn run_plain(&self, args: &[&str]) -> Result<()> {
        self.runner.run_command(&self.config.kubectl, args)
    }

    /// Insert `-n <namespace>` right after the kubectl verb
    fn with_namespace(&self, args: &[&str]) -> Vec<String> {
        let mut full: Vec<String> = Vec::with_capacity(args.len() + 2);
        let mut iter = args.iter();
        if let Some(verb) = iter.next() {
            full.push((*verb).to_string());
        }
        full.push("-n".to_string());
        full.push(self.config.namespace.clone());
        full.extend(iter.map(|s| (*s).to_string()));
        full
    }
}

/// Parse a replica count, treating anything unparsable as 0
fn parse_replicas(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

/// Extract and render a deployment's matchLabels selector
fn parse_selector(deploy: &str, json: &str) -> Result<String> {
    let doc: DeploymentDoc =
        serde_json::from_str(json).map_err(|e| OpsError::json(format!("deploy/{deploy}"), e))?;

    let labels = doc.spec.selector.match_labels;
    if labels.is_empty() {
        return Err(OpsError::MissingSelector {
            deploy: deploy.to_string(),
        });
    }

    Ok(labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(","))
}

/// Find the first declared port of a named service in a `get svc -o json` doc
fn parse_service_port(service: &str, namespace: &str, json: &str) -> Result<u16> {
    let list: ServiceList =
        serde_json::from_str(json).map_err(|e| OpsError::json("service list", e))?;

    for item in &list.items {
        if item.metadata.name != service {
            continue;
        }
        let Some(first) = item.spec.ports.first() else {
            return Err(OpsError::service(
                service,
                format!("Service {service} has no ports"),
            ));
        };
        return first.port.ok_or_else(|| {
            OpsError::service(service, format!("Service {service} port invalid"))
        });
    }

    Err(OpsError::service(
        service,
        format!("Service {service} not found in namespace {namespace}"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOY_JSON: &str = r#"{
        "spec": {
            "selector": {
                "matchLabels": {"app": "controller", "tier": "backend"}
            }
        }
    }"#;

    const SVC_JSON: &str = r#"{
        "items": [
            {
                "metadata": {"name": "archiver"},
                "spec": {"ports": [{"port": 8082}, {"port": 9090}]}
            },
            {
                "metadata": {"name": "portless"},
                "spec": {"ports": []}
            }
        ]
    }"#;

    #[test]
    fn test_parse_replicas_variants() {
        assert_eq!(parse_replicas("3"), 3);
        assert_eq!(parse_replicas(" 7\n"), 7);
        assert_eq!(parse_replicas(""), 0);
        assert_eq!(parse_replicas("Error from server"), 0);
        assert_eq!(parse_replicas("-2"), 0);
    }

    #[test]
    fn test_parse_selector_renders_sorted_pairs() {
        let selector = parse_selector("controller", DEPLOY_JSON).unwrap();
        assert_eq!(selector, "app=controller,tier=backend");
    }

    #[test]
    fn test_parse_selector_missing_labels() {
        let err = parse_selector("controller", r#"{"spec": {"selector": {}}}"#).unwrap_err();
        assert!(matches!(err, OpsError::MissingSelector { .. }));
    }

    #[test]
    fn test_parse_selector_rejects_garbage() {
        let err = parse_selector("controller", "NotFound").unwrap_err();
        assert!(matches!(err, OpsError::Json { .. }));
    }

    #[test]
    fn test_parse_service_port_takes_first() {
        let port = parse_service_port("archiver", "reactor-monitor", SVC_JSON).unwrap();
        assert_eq!(port, 8082);
    }

    #[test]
    fn test_parse_service_port_missing_service() {
        let err = parse_service_port("controller", "reactor-monitor", SVC_JSON).unwrap_err();
        assert!(err.to_string().contains("not found in namespace"));
    }

    #[test]
    fn test_parse_service_port_empty_port_list() {
        let err = parse_service_port("portless", "reactor-monitor", SVC_JSON).unwrap_err();
        assert!(err.to_string().contains("has no ports"));
    }

    #[test]
    fn test_clone_keeps_namespace_binding() {
        let kubectl = Kubectl::new(crate::config::ClusterConfig::default(), false);
        let worker = kubectl.clone();
        assert_eq!(worker.namespace(), "reactor-monitor");
    }

    #[test]
    fn test_with_namespace_injection() {
        let kubectl = Kubectl::new(crate::config::ClusterConfig::default(), false);
        let args = kubectl.with_namespace(&["get", "pods", "-o", "wide"]);
        assert_eq!(args, ["get", "-n", "reactor-monitor", "pods", "-o", "wide"]);
    }
}
