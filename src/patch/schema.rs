//! List merge strategies for strategic merge patches
//!
//! Kubernetes annotates list fields with a patch strategy. Lists marked
//! `merge` are patched element by element, matched on their merge key, so a
//! patch never drops elements it does not mention. Unannotated lists are
//! atomic and replaced whole.

/// How a list field is diffed and patched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStrategy {
    /// Replaced whole when it differs
    Atomic,
    /// List of objects merged element by element on the named key
    MergeByKey(&'static str),
    /// List of scalars merged as a set
    MergePrimitives,
}

/// Patch strategies of one object type, keyed by dotted field path.
///
/// Paths name fields only; list elements add no segment, so the `env` list of
/// every container is `spec.containers.env`.
#[derive(Clone, Copy, Debug)]
pub struct PatchSchema {
    lists: &'static [(&'static str, ListStrategy)],
}

impl PatchSchema {
    /// No merge annotations: every list is atomic
    pub const ATOMIC: PatchSchema = PatchSchema { lists: &[] };

    /// `core/v1` Pod
    pub const POD: PatchSchema = PatchSchema { lists: POD_LISTS };

    /// Build a schema from a static table
    pub const fn new(lists: &'static [(&'static str, ListStrategy)]) -> Self {
        Self { lists }
    }

    /// Strategy for the list at `path`
    pub fn list_strategy(&self, path: &str) -> ListStrategy {
        self.lists
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, strategy)| *strategy)
            .unwrap_or(ListStrategy::Atomic)
    }
}

use ListStrategy::{MergeByKey, MergePrimitives};

const POD_LISTS: &[(&str, ListStrategy)] = &[
    ("metadata.finalizers", MergePrimitives),
    ("metadata.ownerReferences", MergeByKey("uid")),
    ("spec.containers", MergeByKey("name")),
    ("spec.containers.env", MergeByKey("name")),
    ("spec.containers.ports", MergeByKey("containerPort")),
    ("spec.containers.volumeMounts", MergeByKey("mountPath")),
    ("spec.containers.volumeDevices", MergeByKey("devicePath")),
    ("spec.initContainers", MergeByKey("name")),
    ("spec.initContainers.env", MergeByKey("name")),
    ("spec.initContainers.ports", MergeByKey("containerPort")),
    ("spec.initContainers.volumeMounts", MergeByKey("mountPath")),
    ("spec.initContainers.volumeDevices", MergeByKey("devicePath")),
    ("spec.ephemeralContainers", MergeByKey("name")),
    ("spec.ephemeralContainers.env", MergeByKey("name")),
    ("spec.ephemeralContainers.volumeMounts", MergeByKey("mountPath")),
    ("spec.ephemeralContainers.volumeDevices", MergeByKey("devicePath")),
    ("spec.volumes", MergeByKey("name")),
    ("spec.imagePullSecrets", MergeByKey("name")),
    ("spec.hostAliases", MergeByKey("ip")),
    ("spec.topologySpreadConstraints", MergeByKey("topologyKey")),
    ("spec.schedulingGates", MergeByKey("name")),
    ("spec.resourceClaims", MergeByKey("name")),
    ("status.conditions", MergeByKey("type")),
    ("status.podIPs", MergeByKey("ip")),
    ("status.hostIPs", MergeByKey("ip")),
    ("status.resourceClaimStatuses", MergeByKey("name")),
];
