//! Integration tests for status updates and patches from stale snapshots
//!
//! Each test owns a distinct pod name so the stories can run in any order.

use stalepatch::patch::require_spec_key_unchanged;
use stalepatch::pod::{
    bind_pod, create_pod, get_pod, patch_pod_status, update_pod, update_pod_status,
};
use stalepatch::{run_scenario, Error};

use super::helpers::{delete_pod, setup};

// =============================================================================
// Optimistic Concurrency Stories
// =============================================================================

/// Story: a freshly created pod reads back with its identity and no status
///
/// Expected behavior:
/// - Name and namespace match what was submitted
/// - The non-existent scheduler keeps the pod unbound and un-nominated
#[tokio::test]
#[ignore = "requires a cluster - run with: cargo test --test kind -- --ignored"]
async fn story_created_pod_reads_back_unscheduled() {
    let (client, api, config) = setup("stalepatch-roundtrip").await;

    let created = create_pod(&api, &config).await.expect("failed to create pod");
    let fetched = get_pod(&api, &config.namespace, &config.pod_name)
        .await
        .expect("failed to get pod");

    assert_eq!(fetched.name().unwrap(), config.pod_name);
    assert_eq!(fetched.namespace().unwrap(), config.namespace);
    assert_eq!(fetched.pod().metadata.uid, created.pod().metadata.uid);
    assert_eq!(fetched.nominated_node_name(), "");
    assert_eq!(fetched.node_name(), None);

    delete_pod(&client, &config.namespace, &config.pod_name).await;
}

/// Story: the API server refuses status and full replaces from a stale snapshot
#[tokio::test]
#[ignore = "requires a cluster - run with: cargo test --test kind -- --ignored"]
async fn story_stale_replace_is_rejected_with_conflict() {
    let (client, api, config) = setup("stalepatch-stale-update").await;

    let pod = create_pod(&api, &config).await.expect("failed to create pod");
    let updated = update_pod_status(&api, &pod, "minikube")
        .await
        .expect("first status update should succeed");
    assert!(pod.is_stale_against(&updated));

    let err = update_pod_status(&api, &pod, "")
        .await
        .expect_err("stale status update must fail");
    assert!(err.is_conflict(), "expected Conflict, got {err:?}");

    let err = update_pod(&api, &pod)
        .await
        .expect_err("stale full update must fail");
    assert!(err.is_conflict(), "expected Conflict, got {err:?}");

    delete_pod(&client, &config.namespace, &config.pod_name).await;
}

/// Story: a status patch from the same stale snapshot is accepted
#[tokio::test]
#[ignore = "requires a cluster - run with: cargo test --test kind -- --ignored"]
async fn story_stale_patch_without_precondition_succeeds() {
    let (client, api, config) = setup("stalepatch-stale-patch").await;

    let pod = create_pod(&api, &config).await.expect("failed to create pod");
    update_pod_status(&api, &pod, "minikube")
        .await
        .expect("status update should succeed");

    let stale = pod.with_nominated_node_name("minikube");
    patch_pod_status(&api, &stale, "", &[])
        .await
        .expect("patch from a stale snapshot should succeed");

    let live = get_pod(&api, &config.namespace, &config.pod_name)
        .await
        .expect("failed to get pod");
    assert_eq!(live.nominated_node_name(), "");

    delete_pod(&client, &config.namespace, &config.pod_name).await;
}

/// Story: after a binding, a fenced patch from a pre-binding snapshot is
/// refused before it is sent
#[tokio::test]
#[ignore = "requires a cluster - run with: cargo test --test kind -- --ignored"]
async fn story_fenced_patch_is_rejected_after_binding() {
    let (client, api, config) = setup("stalepatch-fenced").await;

    let pod = create_pod(&api, &config).await.expect("failed to create pod");
    bind_pod(&api, &pod, &config.bind_target)
        .await
        .expect("binding should succeed");

    let err = patch_pod_status(
        &api,
        &pod,
        "minikube",
        &[require_spec_key_unchanged("nodeName")],
    )
    .await
    .expect_err("fenced patch must be rejected");
    assert!(
        matches!(err, Error::PreconditionFailed { .. }),
        "expected PreconditionFailed, got {err:?}"
    );

    let live = get_pod(&api, &config.namespace, &config.pod_name)
        .await
        .expect("failed to get pod");
    assert_eq!(live.node_name(), Some(config.bind_target.as_str()));
    assert_eq!(live.nominated_node_name(), "");

    delete_pod(&client, &config.namespace, &config.pod_name).await;
}

/// Story: the full scripted run completes against a real API server
#[tokio::test]
#[ignore = "requires a cluster - run with: cargo test --test kind -- --ignored"]
async fn story_full_scenario_completes() {
    let (client, api, config) = setup("stalepatch-scenario").await;

    let report = run_scenario(&api, &config)
        .await
        .expect("scenario should complete");
    assert!(report.stale_update_error.contains("conflict"));
    assert!(report.fenced_patch_error.contains("spec.nodeName"));
    assert_eq!(report.bound_node, config.bind_target);

    delete_pod(&client, &config.namespace, &config.pod_name).await;
}
