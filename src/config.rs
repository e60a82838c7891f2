//! Connection and scenario configuration
//!
//! Both structs are built once at startup and passed by reference; nothing in
//! the crate reads connection parameters from process-wide state.

use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::Error;

/// How to reach the API server
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Path to a kubeconfig. When neither this nor `master` is set the config
    /// is inferred (in-cluster service account, then `KUBECONFIG` /
    /// `~/.kube/config`).
    pub kubeconfig: Option<PathBuf>,
    /// API server address. Overrides the kubeconfig's server; on its own it
    /// yields an unauthenticated config with the client's default settings.
    pub master: Option<String>,
}

impl ClusterConfig {
    /// Create a config from the two connection flags
    pub fn new(kubeconfig: Option<PathBuf>, master: Option<String>) -> Self {
        Self { kubeconfig, master }
    }

    /// Resolve the kube [`Config`] with the master override applied
    pub async fn kube_config(&self) -> Result<Config, Error> {
        let config = match (&self.kubeconfig, &self.master) {
            (Some(path), master) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::config(format!(
                        "failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let mut config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| Error::config(format!("failed to load kubeconfig: {}", e)))?;
                if let Some(master) = master {
                    config.cluster_url = parse_master_url(master)?;
                }
                config
            }
            // Master only: no kubeconfig or in-cluster lookup
            (None, Some(master)) => Config::new(parse_master_url(master)?),
            (None, None) => Config::infer()
                .await
                .map_err(|e| Error::config(format!("failed to infer config: {}", e)))?,
        };

        debug!(cluster_url = %config.cluster_url, "resolved cluster config");
        Ok(config)
    }

    /// Build a kube [`Client`] from this config
    pub async fn client(&self) -> Result<Client, Error> {
        let config = self.kube_config().await?;
        Client::try_from(config)
            .map_err(|e| Error::config(format!("failed to create client: {}", e)))
    }
}

/// Parse a `--master` value; it must be an absolute URL.
fn parse_master_url(master: &str) -> Result<http::Uri, Error> {
    let uri: http::Uri = master
        .parse()
        .map_err(|e| Error::config(format!("invalid master URL {:?}: {}", master, e)))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(Error::config(format!(
            "master URL {:?} must include a scheme and host",
            master
        )));
    }
    Ok(uri)
}

/// Fixed inputs of the scripted scenario
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// Namespace the placeholder pod lives in
    pub namespace: String,
    /// Name of the placeholder pod
    pub pod_name: String,
    /// Name of the single container
    pub container_name: String,
    /// Container image
    pub image: String,
    /// Scheduler that does not exist, so no scheduler ever claims the pod
    pub scheduler_name: String,
    /// Value written to `status.nominatedNodeName`
    pub nominated_node: String,
    /// Node the pod is bound to; it does not need to exist
    pub bind_target: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            pod_name: "test".to_string(),
            container_name: "pause".to_string(),
            image: "k8s.gcr.io/pause:3.2".to_string(),
            scheduler_name: "non-exist-sched".to_string(),
            nominated_node: "minikube".to_string(),
            bind_target: "foo".to_string(),
        }
    }
}
