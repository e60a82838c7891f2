//! Pod operations used by the scenario
//!
//! Each function is one remote step: read, create, replace, patch, or bind.
//! None of them retries or recovers; errors are classified and returned to
//! the caller.

use k8s_openapi::api::core::v1::{Binding, Container, ObjectReference, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::{debug, info, instrument};

use crate::client::PodApi;
use crate::config::ScenarioConfig;
use crate::patch::{create_two_way_merge_patch, PatchSchema, Precondition};
use crate::snapshot::PodSnapshot;
use crate::Error;

/// Read the current state of a Pod
#[instrument(skip(api))]
pub async fn get_pod(api: &dyn PodApi, namespace: &str, name: &str) -> Result<PodSnapshot, Error> {
    let pod = api.get(namespace, name).await?;
    debug!(resource_version = ?pod.metadata.resource_version, "fetched pod");
    Ok(PodSnapshot::new(pod))
}

/// The placeholder Pod: one pause container and a scheduler that does not
/// exist, so nothing claims it while the scenario runs.
pub fn placeholder_pod(config: &ScenarioConfig) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(config.pod_name.clone()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: config.container_name.clone(),
                image: Some(config.image.clone()),
                ..Default::default()
            }],
            scheduler_name: Some(config.scheduler_name.clone()),
            ..Default::default()
        }),
        status: None,
    }
}

/// Create the placeholder Pod
#[instrument(skip(api, config), fields(namespace = %config.namespace, pod = %config.pod_name))]
pub async fn create_pod(api: &dyn PodApi, config: &ScenarioConfig) -> Result<PodSnapshot, Error> {
    let created = api
        .create(&config.namespace, &placeholder_pod(config))
        .await?;
    info!(resource_version = ?created.metadata.resource_version, "created placeholder pod");
    Ok(PodSnapshot::new(created))
}

/// Replace the whole Pod, guarded by the snapshot's resourceVersion.
#[instrument(skip(api, snapshot), fields(resource_version = ?snapshot.resource_version()))]
pub async fn update_pod(api: &dyn PodApi, snapshot: &PodSnapshot) -> Result<PodSnapshot, Error> {
    let namespace = snapshot.namespace()?;
    let updated = api.replace(namespace, snapshot.pod()).await?;
    Ok(PodSnapshot::new(updated))
}

/// Set `status.nominatedNodeName` through a status replace.
///
/// The snapshot's resourceVersion is sent along, so the server rejects the
/// write with [`Error::Conflict`] if the snapshot is stale. `snapshot` itself
/// is never modified; the server's new state is returned.
#[instrument(skip(api, snapshot), fields(resource_version = ?snapshot.resource_version()))]
pub async fn update_pod_status(
    api: &dyn PodApi,
    snapshot: &PodSnapshot,
    nominated: &str,
) -> Result<PodSnapshot, Error> {
    let namespace = snapshot.namespace()?;
    let desired = snapshot.with_nominated_node_name(nominated);
    let updated = api.replace_status(namespace, desired.pod()).await?;
    debug!(
        new_resource_version = ?updated.metadata.resource_version,
        "pod status replaced"
    );
    Ok(PodSnapshot::new(updated))
}

/// Set `status.nominatedNodeName` through a strategic merge patch on the
/// status subresource.
///
/// The patch is the difference between `baseline` and the mutated working
/// copy. Merge-keyed lists such as `status.conditions` carry only the
/// elements that changed, so entries other writers add in the meantime
/// survive. With preconditions the working copy is the live Pod rather than the
/// baseline, so any change made since the baseline was read shows up in the
/// patch and can be fenced off; a rejected patch is never sent. The patch
/// carries no resourceVersion, so staleness alone never fails this call.
#[instrument(skip(api, baseline, preconditions), fields(
    resource_version = ?baseline.resource_version(),
    preconditions = preconditions.len()
))]
pub async fn patch_pod_status(
    api: &dyn PodApi,
    baseline: &PodSnapshot,
    nominated: &str,
    preconditions: &[Precondition],
) -> Result<PodSnapshot, Error> {
    let namespace = baseline.namespace()?;
    let name = baseline.name()?;
    let before = baseline.to_json()?;

    let working = if preconditions.is_empty() {
        baseline.clone()
    } else {
        get_pod(api, namespace, name).await?
    };
    let after = working.with_nominated_node_name(nominated).to_json()?;

    let mut patch =
        create_two_way_merge_patch(&before, &after, &PatchSchema::POD, preconditions)?;
    patch.remove_path(&["metadata", "resourceVersion"]);
    if patch.is_empty() {
        debug!("nothing to patch");
        return Ok(working);
    }

    let patched = api
        .patch_status(namespace, name, patch.as_value())
        .await?;
    debug!(
        new_resource_version = ?patched.metadata.resource_version,
        "pod status patched"
    );
    Ok(PodSnapshot::new(patched))
}

/// Bind the Pod to `node`. The node does not have to exist.
#[instrument(skip(api, snapshot))]
pub async fn bind_pod(api: &dyn PodApi, snapshot: &PodSnapshot, node: &str) -> Result<(), Error> {
    let namespace = snapshot.namespace()?;
    let binding = Binding {
        metadata: ObjectMeta {
            name: Some(snapshot.name()?.to_string()),
            namespace: Some(namespace.to_string()),
            uid: snapshot.pod().metadata.uid.clone(),
            ..Default::default()
        },
        target: ObjectReference {
            kind: Some("Node".to_string()),
            name: Some(node.to_string()),
            ..Default::default()
        },
    };
    api.bind(namespace, &binding).await?;
    info!(node, "bound pod");
    Ok(())
}
