//! Faults at every stage of a run.
//!
//! Whatever fails, each provisioned node must be torn down exactly once and
//! no output file may appear.

use std::path::Path;
use std::sync::Arc;

use dag_core::DagError;
use dag_harness::{run_net, RunConfig, RunError, RunReport, SimFaults, SimNetwork};
use dag_render::Stage;

use crate::assertions::assert_torn_down_once;
use crate::fixtures::{config, FakeSvgConverter, MissingBinaryConverter, PanickingConverter};

fn faulty(faults: SimFaults) -> Arc<SimNetwork> {
    Arc::new(SimNetwork::default().with_faults(faults))
}

async fn run_into(
    net: &Arc<SimNetwork>,
    config: RunConfig,
    dir: &Path,
) -> Result<RunReport, RunError> {
    run_net(Arc::clone(net), &config, Some(dir), FakeSvgConverter::default()).await
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

// ============================================================================
// Provisioning and mesh
// ============================================================================

/// Third node fails to start: the first two are torn down, nothing else runs.
#[tokio::test]
async fn provision_failure_tears_down_created_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        fail_create_at: Some(2),
        ..Default::default()
    });

    let err = run_into(&net, config(4, 5), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Provision { index: 2, .. }));
    assert!(err.to_string().starts_with("unable to create node 2"));
    assert_eq!(net.created(), vec![0, 1]);
    assert_torn_down_once(&net.teardowns(), &[0, 1]).expect_pass();
    assert!(is_empty_dir(dir.path()));
}

/// Third node panics while starting: the first two are torn down, then the
/// panic propagates.
#[tokio::test]
async fn provision_panic_tears_down_created_nodes() {
    let net = faulty(SimFaults {
        panic_create_at: Some(2),
        ..Default::default()
    });

    let run = tokio::spawn({
        let net = Arc::clone(&net);
        async move { run_net(net, &config(4, 5), None, FakeSvgConverter::default()).await }
    });

    assert!(run.await.unwrap_err().is_panic());
    assert_eq!(net.created(), vec![0, 1]);
    assert_torn_down_once(&net.teardowns(), &[0, 1]).expect_pass();
}

/// A failed connection aborts the run before any block is generated.
#[tokio::test]
async fn mesh_failure_tears_down_all() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        fail_connect_at: Some(1),
        ..Default::default()
    });

    let err = run_into(&net, config(4, 5), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Mesh { .. }));
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2, 3]).expect_pass();
    assert!(is_empty_dir(dir.path()));
}

// ============================================================================
// Generation
// ============================================================================

/// One node's generation fails; the error names it and every node is stopped.
#[tokio::test]
async fn generation_failure_names_node() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        fail_generate_at: Some(3),
        ..Default::default()
    });

    let err = run_into(&net, config(4, 8), dir.path())
        .await
        .unwrap_err();

    match &err {
        RunError::Generation {
            index,
            failed,
            total,
            ..
        } => {
            assert_eq!(*index, 3);
            assert_eq!(*failed, 1);
            assert_eq!(*total, 4);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("failed to wait for blocks to generate on node 3"));
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2, 3]).expect_pass();
    assert!(is_empty_dir(dir.path()));
}

/// A panicking generation task is reported as that node's failure.
#[tokio::test]
async fn generation_panic_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        panic_generate_at: Some(1),
        ..Default::default()
    });

    let err = run_into(&net, config(3, 4), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Generation { index: 1, .. }));
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2]).expect_pass();
}

// ============================================================================
// Extraction
// ============================================================================

/// An unreadable view fails the run with that node's index.
#[tokio::test]
async fn view_failure_tears_down_all() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        fail_view_at: Some(2),
        ..Default::default()
    });

    let err = run_into(&net, config(4, 5), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Extraction { index: 2, .. }));
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2, 3]).expect_pass();
    assert!(is_empty_dir(dir.path()));
}

/// Nodes disagreeing on a block's parents is fatal.
#[tokio::test]
async fn divergent_views_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        diverge_view_at: Some(3),
        ..Default::default()
    });

    let err = run_into(&net, config(4, 5), dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Dag(DagError::ConsistencyViolation { .. })));
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2, 3]).expect_pass();
    assert!(is_empty_dir(dir.path()));
}

// ============================================================================
// Rendering and output
// ============================================================================

/// A missing converter fails at the image stage with nothing written.
#[tokio::test]
async fn missing_converter_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dag.html");
    let net = Arc::new(SimNetwork::default());

    let err = run_net(Arc::clone(&net), &config(2, 3), Some(&path), MissingBinaryConverter)
        .await
        .unwrap_err();

    match &err {
        RunError::Render(render) => assert!(matches!(render.stage(), Some(Stage::Image))),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!path.exists());
    assert_torn_down_once(&net.teardowns(), &[0, 1]).expect_pass();
}

/// Output under a directory that does not exist cannot be created.
#[tokio::test]
async fn unavailable_destination_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("dag.html");
    let net = Arc::new(SimNetwork::default());

    let err = run_net(Arc::clone(&net), &config(2, 3), Some(&path), FakeSvgConverter::default())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed to create output file-handle"));
    assert_torn_down_once(&net.teardowns(), &[0, 1]).expect_pass();
}

/// A panic inside the pipeline still tears every node down, then propagates.
#[tokio::test]
async fn converter_panic_tears_down_then_propagates() {
    let net = Arc::new(SimNetwork::default());

    let run = tokio::spawn({
        let net = Arc::clone(&net);
        async move { run_net(net, &config(3, 3), None, PanickingConverter).await }
    });

    let joined = run.await.unwrap_err();
    assert!(joined.is_panic());
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2]).expect_pass();
}

/// A node panicking while it stops does not keep the others running.
#[tokio::test]
async fn teardown_panic_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        panic_teardown_at: Some(0),
        ..Default::default()
    });

    let report = run_into(&net, config(4, 3), dir.path()).await.unwrap();

    assert!(report.output.exists());
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2, 3]).expect_pass();
}

/// A node failing to stop does not fail the run or skip the others.
#[tokio::test]
async fn teardown_failure_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let net = faulty(SimFaults {
        fail_teardown_at: Some(1),
        ..Default::default()
    });

    let report = run_into(&net, config(3, 3), dir.path())
        .await
        .unwrap();

    assert!(report.output.exists());
    assert_torn_down_once(&net.teardowns(), &[0, 1, 2]).expect_pass();
}
