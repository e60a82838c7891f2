//! Pod API seam
//!
//! Every remote call the scenario makes goes through [`PodApi`]. The
//! production implementation talks to the API server through `kube`; tests
//! use the generated mock or an in-memory store with real resourceVersion
//! semantics.


use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Binding, Pod};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::Value;
use tracing::{debug, instrument};

#[cfg(test)]
use mockall::automock;

use crate::Error;

/// Trait abstracting the Pod verbs used by the scenario
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PodApi: Send + Sync {
    /// Create a Pod in `namespace`
    async fn create(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error>;

    /// Read a Pod by name
    async fn get(&self, namespace: &str, name: &str) -> Result<Pod, Error>;

    /// Replace the whole Pod; the embedded resourceVersion must be current
    async fn replace(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error>;

    /// Replace the `status` subresource; the embedded resourceVersion must be current
    async fn replace_status(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error>;

    /// Apply a strategic merge patch to the `status` subresource
    ///
    /// # Arguments
    ///
    /// * `namespace` - Namespace of the Pod
    /// * `name` - Name of the Pod
    /// * `patch` - Strategic merge patch document; carries no resourceVersion
    async fn patch_status(&self, namespace: &str, name: &str, patch: &Value)
        -> Result<Pod, Error>;

    /// Post a Binding to the Pod's `binding` subresource
    async fn bind(&self, namespace: &str, binding: &Binding) -> Result<(), Error>;
}

/// Real Kubernetes implementation of [`PodApi`]
#[derive(Clone)]
pub struct KubePodApi {
    client: Client,
}

impl KubePodApi {
    /// Create a new KubePodApi wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn pod_name(pod: &Pod) -> Result<&str, Error> {
    pod.metadata
        .name
        .as_deref()
        .ok_or_else(|| Error::validation("pod has no metadata.name"))
}

#[async_trait]
impl PodApi for KubePodApi {
    #[instrument(skip(self, pod), fields(pod_name = ?pod.metadata.name))]
    async fn create(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error> {
        let created = self.api(namespace).create(&PostParams::default(), pod).await?;
        debug!(resource_version = ?created.metadata.resource_version, "pod created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get(&self, namespace: &str, name: &str) -> Result<Pod, Error> {
        Ok(self.api(namespace).get(name).await?)
    }

    #[instrument(skip(self, pod), fields(pod_name = ?pod.metadata.name, resource_version = ?pod.metadata.resource_version))]
    async fn replace(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error> {
        let name = pod_name(pod)?;
        Ok(self
            .api(namespace)
            .replace(name, &PostParams::default(), pod)
            .await?)
    }

    #[instrument(skip(self, pod), fields(pod_name = ?pod.metadata.name, resource_version = ?pod.metadata.resource_version))]
    async fn replace_status(&self, namespace: &str, pod: &Pod) -> Result<Pod, Error> {
        let name = pod_name(pod)?;
        let data = serde_json::to_vec(pod)?;
        Ok(self
            .api(namespace)
            .replace_status(name, &PostParams::default(), data)
            .await?)
    }

    #[instrument(skip(self, patch))]
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<Pod, Error> {
        debug!(%patch, "patching pod status");
        Ok(self
            .api(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Strategic(patch))
            .await?)
    }

    #[instrument(skip(self, binding), fields(pod_name = ?binding.metadata.name, target = ?binding.target.name))]
    async fn bind(&self, namespace: &str, binding: &Binding) -> Result<(), Error> {
        let name = binding
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::validation("binding has no metadata.name"))?;
        let data = serde_json::to_vec(binding)?;
        // The server answers with a Status object; its content carries nothing we use
        let _: Value = self
            .api(namespace)
            .create_subresource("binding", name, &PostParams::default(), data)
            .await?;
        Ok(())
    }
}
