//! Unit tests for the lifecycle controller

use crate::controller::CreateRequest;
use crate::error::{LifecycleError, StatusCode};
use crate::test_utils::{topology_files, Harness, DEMO_CONFIG};
use cluster_clients::{MockCall, MockCluster, MockOperation, WorkloadKind, WorkloadSpec};
use cluster_config::KindNode;
use std::path::PathBuf;
use std::time::Duration;

fn from_config(path: PathBuf) -> CreateRequest {
    CreateRequest {
        name: None,
        config: Some(path),
    }
}

fn named(name: &str) -> CreateRequest {
    CreateRequest {
        name: Some(name.to_string()),
        config: None,
    }
}

#[tokio::test]
async fn test_create_from_config_end_to_end() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let name = h.controller.create(&from_config(config)).await.unwrap();
    assert_eq!(name, "demo");

    let mutations = h.mock.mutations();
    assert_eq!(mutations.len(), 4, "unexpected mutations: {:?}", mutations);

    match &mutations[0] {
        MockCall::Provision {
            name,
            topology: Some(topology),
        } => {
            assert_eq!(name, "demo");
            assert_eq!(topology.kind, "Cluster");
            assert_eq!(topology.api_version, "kind.x-k8s.io/v1alpha4");
            assert_eq!(
                topology.nodes,
                vec![
                    KindNode::new("control-plane"),
                    KindNode::new("worker"),
                    KindNode::new("worker"),
                ]
            );
        }
        other => panic!("expected provisioning with a topology, got {:?}", other),
    }
    assert_eq!(
        mutations[1],
        MockCall::CreateNamespace {
            name: "web-ns".to_string()
        }
    );
    assert_eq!(
        mutations[2],
        MockCall::CreateWorkload {
            spec: WorkloadSpec {
                name: "web".to_string(),
                namespace: "web-ns".to_string(),
                image: "nginx:1.27".to_string(),
                kind: WorkloadKind::Deployment { replicas: 2 },
            }
        }
    );
    assert!(matches!(
        &mutations[3],
        MockCall::InstallChart { release, namespace, create_namespace: true, context }
            if release == "metrics-server" && namespace == "kube-system" && context == "kind-demo"
    ));

    assert!(h.mock.contexts().contains("kind-demo"));
    assert!(h.mock.workload("web-ns", "web").is_some());
    assert!(h.topology_files().is_empty());
}

#[tokio::test]
async fn test_create_runs_phases_in_order() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config("demo.yaml", DEMO_CONFIG);
    h.controller.create(&from_config(config)).await.unwrap();

    let kinds: Vec<&str> = h
        .mock
        .calls()
        .iter()
        .map(|c| match c {
            MockCall::ListContexts => "list",
            MockCall::InspectImage { .. } => "image",
            MockCall::Provision { .. } => "provision",
            MockCall::Connect { .. } => "connect",
            MockCall::GetNamespace { .. } => "get-ns",
            MockCall::CreateNamespace { .. } => "create-ns",
            MockCall::CreateWorkload { .. } => "workload",
            MockCall::LocateChart { .. } => "locate",
            MockCall::LoadChart { .. } => "load",
            MockCall::InstallChart { .. } => "install",
            MockCall::Deprovision { .. } => "deprovision",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "list", "image", "provision", "connect", "get-ns", "create-ns", "workload", "locate",
            "load", "install"
        ]
    );
}

#[tokio::test]
async fn test_create_existing_cluster_is_rejected_without_mutation() {
    let mock = MockCluster::new();
    mock.add_cluster("demo");
    mock.add_image("nginx:1.27");
    let h = Harness::with_mock(mock);
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyExists(ref name) if name == "demo"));
    assert_eq!(err.code(), StatusCode::AlreadyExists);
    assert!(h.mock.mutations().is_empty());
    assert_eq!(h.mock.calls(), vec![MockCall::ListContexts]);
}

#[tokio::test]
async fn test_create_existing_cluster_by_name_is_rejected() {
    let mock = MockCluster::new();
    mock.add_cluster("scratch");
    let h = Harness::with_mock(mock);

    let err = h.controller.create(&named("scratch")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyExists(_)));
    assert!(h.mock.mutations().is_empty());
}

#[tokio::test]
async fn test_create_by_name_uses_default_topology() {
    let h = Harness::new();
    h.controller.create(&named("scratch")).await.unwrap();

    let mutations = h.mock.mutations();
    assert_eq!(
        mutations[0],
        MockCall::Provision {
            name: "scratch".to_string(),
            topology: None,
        }
    );
    // No applications to reconcile, default charts still installed
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Connect { .. })), 0);
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::InspectImage { .. })), 0);
    assert_eq!(h.mock.releases().get("metrics-server").map(String::as_str), Some("kube-system"));
}

#[tokio::test]
async fn test_create_without_name_or_config_uses_default_name() {
    let h = Harness::new();
    let name = h.controller.create(&CreateRequest::default()).await.unwrap();
    assert_eq!(name, "kind");
    assert!(h.mock.contexts().contains("kind-kind"));
}

#[tokio::test]
async fn test_create_name_must_match_config() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let request = CreateRequest {
        name: Some("other".to_string()),
        config: Some(config),
    };
    let err = h.controller.create(&request).await.unwrap_err();
    assert!(matches!(err, LifecycleError::FailedPrecondition(_)));
    assert!(h.mock.calls().is_empty());
}

#[tokio::test]
async fn test_create_name_fills_in_unnamed_config() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let unnamed = DEMO_CONFIG.replace("name: demo\n", "");
    let config = h.write_config("unnamed.yaml", &unnamed);

    let request = CreateRequest {
        name: Some("named".to_string()),
        config: Some(config),
    };
    assert_eq!(h.controller.create(&request).await.unwrap(), "named");
    assert!(h.mock.contexts().contains("kind-named"));
}

#[tokio::test]
async fn test_create_unnamed_config_fails_validation() {
    let h = Harness::new();
    let unnamed = DEMO_CONFIG.replace("name: demo\n", "");
    let config = h.write_config("unnamed.yaml", &unnamed);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert_eq!(err.to_string(), "a cluster name must be specified");
    assert!(h.mock.mutations().is_empty());
}

#[tokio::test]
async fn test_validation_failure_mutates_nothing() {
    // Image is missing from the local store
    let h = Harness::new();
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ImageNotFound { ref image, .. } if image == "nginx:1.27"));
    assert_eq!(err.code(), StatusCode::NotFound);
    assert!(h.mock.mutations().is_empty());
    assert!(h.topology_files().is_empty());
}

#[tokio::test]
async fn test_malformed_config_is_parse_error() {
    let h = Harness::new();
    let config = h.write_config("broken.yaml", "name: [unterminated\n");

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigParse(_)));
    assert!(h.mock.calls().is_empty());
}

#[tokio::test]
async fn test_missing_config_file_is_parse_error() {
    let h = Harness::new();
    let missing = h.dir.path().join("missing.yaml");
    let err = h.controller.create(&from_config(missing)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigParse(_)));
}

#[tokio::test]
async fn test_topology_file_removed_when_provisioning_fails() {
    let mock = MockCluster::new();
    mock.add_image("nginx:1.27");
    mock.fail_on(MockOperation::Provision);
    let h = Harness::with_mock(mock);
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Provisioning { ref name, operation: "creating", .. } if name == "demo"
    ));
    // The provisioner saw the descriptor, and it is gone afterwards
    assert!(matches!(
        &h.mock.calls()[2],
        MockCall::Provision { topology: Some(_), .. }
    ));
    assert!(h.topology_files().is_empty());
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Connect { .. })), 0);
}

#[tokio::test]
async fn test_create_keeps_config_named_like_the_descriptor() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config("cluster-config.yaml", DEMO_CONFIG);

    h.controller.create(&from_config(config.clone())).await.unwrap();

    assert_eq!(std::fs::read_to_string(&config).unwrap(), DEMO_CONFIG);
    assert!(matches!(
        &h.mock.calls()[2],
        MockCall::Provision { topology: Some(t), .. } if t.nodes.len() == 3
    ));
    assert!(h.topology_files().is_empty());
}

#[tokio::test]
async fn test_cancel_during_provisioning_removes_topology_file() {
    let mock = MockCluster::new();
    mock.add_image("nginx:1.27");
    mock.stall_on(MockOperation::Provision);
    let h = Harness::with_mock(mock);
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let cancel = h.cancel.clone();
    let watcher = h.mock.clone();
    let dir = h.dir.path().to_path_buf();
    let canceller = tokio::spawn(async move {
        while watcher.count(|c| matches!(c, MockCall::Provision { .. })) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let in_flight = topology_files(&dir).len();
        cancel.cancel();
        in_flight
    });

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert_eq!(canceller.await.unwrap(), 1);
    assert!(matches!(
        err,
        LifecycleError::Cancelled { ref operation } if operation == "creating cluster demo"
    ));
    assert_eq!(err.exit_code(), 130);
    assert!(h.topology_files().is_empty());
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Connect { .. })), 0);
}

#[tokio::test]
async fn test_connect_failure_is_a_reconciliation_failure() {
    let mock = MockCluster::new();
    mock.add_image("nginx:1.27");
    mock.fail_on(MockOperation::Connect);
    let h = Harness::with_mock(mock);
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Connect { ref name, ref context, .. } if name == "demo" && context == "kind-demo"
    ));
    assert_eq!(err.exit_code(), 9);
    assert_eq!(err.code(), StatusCode::Unavailable);
    assert!(h.mock.contexts().contains("kind-demo"));
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::CreateNamespace { .. })), 0);
}

#[tokio::test]
async fn test_unsupported_type_fails_after_provisioning() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config(
        "statefulset.yaml",
        &DEMO_CONFIG.replace("type: deployment", "type: statefulset"),
    );

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::UnsupportedApplicationType { ref application, .. } if application == "web"
    ));
    // The cluster exists; nothing was created inside it
    assert!(h.mock.contexts().contains("kind-demo"));
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::GetNamespace { .. })), 0);
    assert!(h.mock.releases().is_empty());
}

#[tokio::test]
async fn test_chart_failure_leaves_cluster_in_place() {
    let mock = MockCluster::new();
    mock.add_image("nginx:1.27");
    mock.fail_on(MockOperation::InstallChart);
    let h = Harness::with_mock(mock);
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let err = h.controller.create(&from_config(config)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Install { ref chart, .. } if chart == "metrics-server"));
    assert!(h.mock.contexts().contains("kind-demo"));
    assert!(h.mock.workload("web-ns", "web").is_some());
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Deprovision { .. })), 0);
}

#[tokio::test]
async fn test_missing_chart_manifest_fails_after_provisioning() {
    let h = Harness::new();
    std::fs::remove_file(h.dir.path().join("charts.yaml")).unwrap();

    let err = h.controller.create(&named("scratch")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Manifest { .. }));
    assert!(h.mock.contexts().contains("kind-scratch"));
}

#[tokio::test]
async fn test_oracle_failure_aborts_create() {
    let mock = MockCluster::new();
    mock.fail_on(MockOperation::ListContexts);
    let h = Harness::with_mock(mock);

    let err = h.controller.create(&named("scratch")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Oracle { .. }));
    assert_eq!(err.code(), StatusCode::Unavailable);
    assert!(h.mock.mutations().is_empty());
}

#[tokio::test]
async fn test_cancelled_create_issues_no_calls() {
    let h = Harness::new();
    h.cancel.cancel();

    let err = h.controller.create(&named("scratch")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Cancelled { .. }));
    assert!(h.mock.calls().is_empty());
}

#[tokio::test]
async fn test_delete_missing_cluster_is_not_found() {
    let h = Harness::new();

    let err = h.controller.delete(Some("ghost")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(ref name) if name == "ghost"));
    assert_eq!(err.code(), StatusCode::NotFound);
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Deprovision { .. })), 0);
}

#[tokio::test]
async fn test_delete_existing_cluster() {
    let mock = MockCluster::new();
    mock.add_cluster("demo");
    let h = Harness::with_mock(mock);

    assert_eq!(h.controller.delete(Some("demo")).await.unwrap(), "demo");
    assert_eq!(
        h.mock.mutations(),
        vec![MockCall::Deprovision {
            name: "demo".to_string(),
            kubeconfig: h.dir.path().join("kubeconfig"),
        }]
    );
    assert!(!h.mock.contexts().contains("kind-demo"));
}

#[tokio::test]
async fn test_delete_defaults_to_kind() {
    let mock = MockCluster::new();
    mock.add_cluster("kind");
    let h = Harness::with_mock(mock);
    assert_eq!(h.controller.delete(None).await.unwrap(), "kind");
}

#[tokio::test]
async fn test_delete_provisioner_failure() {
    let mock = MockCluster::new();
    mock.add_cluster("demo");
    mock.fail_on(MockOperation::Deprovision);
    let h = Harness::with_mock(mock);

    let err = h.controller.delete(Some("demo")).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Provisioning { operation: "deleting", .. }));
}

#[tokio::test]
async fn test_create_then_delete_then_create_again() {
    let h = Harness::new();
    h.controller.create(&named("scratch")).await.unwrap();
    h.controller.delete(Some("scratch")).await.unwrap();
    h.controller.create(&named("scratch")).await.unwrap();
    assert_eq!(h.mock.count(|c| matches!(c, MockCall::Provision { .. })), 2);
}

#[tokio::test]
async fn test_validate_only_queries_images() {
    let h = Harness::new();
    h.mock.add_image("nginx:1.27");
    let config = h.write_config("demo.yaml", DEMO_CONFIG);

    let parsed = h.controller.validate(&config).await.unwrap();
    assert_eq!(parsed.name, "demo");
    assert_eq!(
        h.mock.calls(),
        vec![MockCall::InspectImage {
            image: "nginx:1.27".to_string()
        }]
    );
}
