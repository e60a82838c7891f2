//! The scripted update-vs-patch scenario
//!
//! 1. Create the placeholder pod and read it back.
//! 2. Nominate a node through a status update (succeeds).
//! 3. Replay the pre-update snapshot as a status update clearing the
//!    nomination: the server must answer Conflict.
//! 4. Send the same change from the same stale snapshot as a patch: it must
//!    succeed, and a fresh read must show the nomination cleared.
//! 5. Bind the pod, then patch from a snapshot that predates the binding with
//!    a precondition fencing `spec.nodeName`: the patch must be rejected
//!    before it is sent.
//!
//! Only the two expected failures are absorbed here. Every other error, and
//! any expected failure that does not happen, is returned to the caller.

use tracing::{debug, info};

use crate::client::PodApi;
use crate::config::ScenarioConfig;
use crate::patch::require_spec_key_unchanged;
use crate::pod::{bind_pod, create_pod, get_pod, patch_pod_status, update_pod_status};
use crate::Error;

/// What the scenario observed at its two expected-failure steps
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Error returned for the status update from a stale snapshot
    pub stale_update_error: String,
    /// Error returned for the fenced patch from a pre-binding snapshot
    pub fenced_patch_error: String,
    /// `spec.nodeName` of the pod after binding
    pub bound_node: String,
}

/// Run the whole scenario against `api`
pub async fn run_scenario(
    api: &dyn PodApi,
    config: &ScenarioConfig,
) -> Result<ScenarioReport, Error> {
    let namespace = config.namespace.as_str();
    let name = config.pod_name.as_str();
    let nominated = config.nominated_node.as_str();

    create_pod(api, config).await?;
    let pod = get_pod(api, namespace, name).await?;

    let updated = update_pod_status(api, &pod, nominated).await?;
    // Same version token as `pod`, same content as the server now holds
    let stale = pod.with_nominated_node_name(nominated);
    debug!(
        held = ?stale.resource_version(),
        current = ?updated.resource_version(),
        "derived stale snapshot"
    );

    let stale_update_error = match update_pod_status(api, &stale, "").await {
        Err(e) if e.is_conflict() => {
            info!(error = %e, "UpdatePodStatus with stale version rejected");
            e.to_string()
        }
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(Error::scenario(
                "expected a conflict when updating pod status from a stale version, but the update succeeded",
            ))
        }
    };

    patch_pod_status(api, &stale, "", &[]).await?;

    let pod = get_pod(api, namespace, name).await?;
    if !pod.nominated_node_name().is_empty() {
        return Err(Error::scenario(format!(
            "expected empty status.nominatedNodeName, got {:?}",
            pod.nominated_node_name()
        )));
    }
    info!("stale patch cleared the nomination");

    bind_pod(api, &pod, &config.bind_target).await?;

    // `pod` predates the binding; only the precondition stands between it and a blind patch
    let fenced_patch_error = match patch_pod_status(
        api,
        &pod,
        nominated,
        &[require_spec_key_unchanged("nodeName")],
    )
    .await
    {
        Err(e) if e.is_precondition_failed() => {
            info!(error = %e, "PatchPodStatus with stale version rejected");
            e.to_string()
        }
        Err(e) => return Err(e),
        Ok(_) => {
            return Err(Error::scenario(
                "expected the spec.nodeName precondition to reject a patch from a pre-binding snapshot",
            ))
        }
    };

    let bound = get_pod(api, namespace, name).await?;
    Ok(ScenarioReport {
        stale_update_error,
        fenced_patch_error,
        bound_node: bound.node_name().unwrap_or_default().to_string(),
    })
}
