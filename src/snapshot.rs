//! Versioned pod snapshots
//!
//! A [`PodSnapshot`] is an immutable copy of a Pod as the API server last
//! reported it, tagged with the server's `resourceVersion`. Local mutations
//! return a new snapshot that keeps the old version token, which is exactly
//! what makes it stale once the server accepts another write.

use k8s_openapi::api::core::v1::Pod;
use serde_json::Value;

use crate::Error;

/// Point-in-time copy of a Pod together with its version token
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PodSnapshot {
    pod: Pod,
}

impl PodSnapshot {
    /// Wrap a Pod returned by the API server
    pub fn new(pod: Pod) -> Self {
        Self { pod }
    }

    /// The wrapped Pod
    pub fn pod(&self) -> &Pod {
        &self.pod
    }

    /// Consume the snapshot, returning the Pod
    pub fn into_pod(self) -> Pod {
        self.pod
    }

    /// Pod name; required for every remote operation
    pub fn name(&self) -> Result<&str, Error> {
        self.pod
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::validation("pod has no metadata.name"))
    }

    /// Pod namespace; required for every remote operation
    pub fn namespace(&self) -> Result<&str, Error> {
        self.pod
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| Error::validation("pod has no metadata.namespace"))
    }

    /// Version token assigned by the API server
    pub fn resource_version(&self) -> Option<&str> {
        self.pod.metadata.resource_version.as_deref()
    }

    /// `status.nominatedNodeName`, with absent reported as empty
    pub fn nominated_node_name(&self) -> &str {
        self.pod
            .status
            .as_ref()
            .and_then(|s| s.nominated_node_name.as_deref())
            .unwrap_or_default()
    }

    /// `spec.nodeName`, set once the pod has been bound
    pub fn node_name(&self) -> Option<&str> {
        self.pod.spec.as_ref().and_then(|s| s.node_name.as_deref())
    }

    /// A copy with `status.nominatedNodeName` replaced.
    ///
    /// The version token is carried over unchanged. An empty name clears the
    /// field rather than storing an empty string.
    pub fn with_nominated_node_name(&self, nominated: &str) -> Self {
        let mut pod = self.pod.clone();
        let value = (!nominated.is_empty()).then(|| nominated.to_string());
        match pod.status.as_mut() {
            Some(status) => status.nominated_node_name = value,
            None if value.is_some() => {
                pod.status = Some(k8s_openapi::api::core::v1::PodStatus {
                    nominated_node_name: value,
                    ..Default::default()
                });
            }
            None => {}
        }
        Self { pod }
    }

    /// True when `current` carries a different version token than this snapshot.
    ///
    /// A snapshot without a token is always stale: the server would reject it
    /// on any version-checked write.
    pub fn is_stale_against(&self, current: &PodSnapshot) -> bool {
        match (self.resource_version(), current.resource_version()) {
            (Some(mine), Some(theirs)) => mine != theirs,
            _ => true,
        }
    }

    /// Serialize the whole Pod as JSON
    pub fn to_json(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(&self.pod)?)
    }
}

impl From<Pod> for PodSnapshot {
    fn from(pod: Pod) -> Self {
        Self::new(pod)
    }
}
