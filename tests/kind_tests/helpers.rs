//! Shared fixtures for the cluster-backed tests

use std::time::Duration;

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams};
use kube::Client;

use stalepatch::{ClusterConfig, KubePodApi, ScenarioConfig};

/// Connect to whatever cluster the environment points at
pub async fn ensure_test_cluster() -> Result<Client, String> {
    ClusterConfig::default()
        .client()
        .await
        .map_err(|e| format!("failed to connect to cluster: {}", e))
}

/// Build a PodApi plus a scenario config for a uniquely named pod
pub async fn setup(pod_name: &str) -> (Client, KubePodApi, ScenarioConfig) {
    let client = ensure_test_cluster()
        .await
        .expect("failed to setup cluster");
    let config = ScenarioConfig {
        pod_name: pod_name.to_string(),
        ..Default::default()
    };
    delete_pod(&client, &config.namespace, pod_name).await;
    (client.clone(), KubePodApi::new(client), config)
}

/// Force-delete a pod and wait until the name is free again
pub async fn delete_pod(client: &Client, namespace: &str, name: &str) {
    let api: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let params = DeleteParams {
        grace_period_seconds: Some(0),
        ..Default::default()
    };
    let _ = api.delete(name, &params).await;

    for _ in 0..30 {
        match api.get_opt(name).await {
            Ok(None) => return,
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }
    panic!("pod {namespace}/{name} was not deleted in time");
}
