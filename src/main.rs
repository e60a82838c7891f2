//! stalepatch - runs the update-vs-patch conflict scenario against a cluster

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stalepatch::{run_scenario, ClusterConfig, KubePodApi, ScenarioConfig};

/// Exercise stale status updates and precondition-guarded status patches
#[derive(Parser, Debug)]
#[command(name = "stalepatch", version, about, long_about = None)]
struct Cli {
    /// Path to a kubeconfig. Only required if out-of-cluster.
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// The address of the Kubernetes API server. Overrides any value in kubeconfig.
    /// Only required if out-of-cluster.
    #[arg(long)]
    master: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cluster = ClusterConfig::new(cli.kubeconfig, cli.master);

    let client = cluster
        .client()
        .await
        .context("Error building kubeconfig")?;
    let api = KubePodApi::new(client);
    let scenario = ScenarioConfig::default();

    info!(namespace = %scenario.namespace, pod = %scenario.pod_name, "starting scenario");
    match run_scenario(&api, &scenario).await {
        Ok(report) => {
            info!(
                stale_update = %report.stale_update_error,
                fenced_patch = %report.fenced_patch_error,
                bound_node = %report.bound_node,
                "scenario completed"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "scenario failed");
            Err(e.into())
        }
    }
}
