//! Test utilities for controller and reconciler tests
//!
//! Fixtures write configs and chart manifests into a scratch directory and
//! wire a `LifecycleController` to a `MockCluster`.

use crate::controller::{Collaborators, LifecycleController};
use crate::settings::LifecycleSettings;
use crate::topology::TOPOLOGY_FILE_PREFIX;
use cluster_clients::MockCluster;
use cluster_config::{Application, ClusterConfig, NodesConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// One control plane, two workers, one deployment
pub const DEMO_CONFIG: &str = r#"
name: demo
nodes:
  control_plane: 1
  worker: 2
applications:
  - name: web
    namespace: web-ns
    replicas: 2
    image: nginx:1.27
    type: deployment
"#;

pub const DEMO_CHARTS: &str = r#"
helm_charts:
  - name: metrics-server
    namespace: kube-system
    url: https://kubernetes-sigs.github.io/metrics-server
    tgz: metrics-server-3.12.2.tgz
"#;

/// Scratch directory plus the mock and controller built on it
pub struct Harness {
    pub dir: TempDir,
    pub mock: MockCluster,
    pub controller: LifecycleController,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_mock(MockCluster::new())
    }

    pub fn with_mock(mock: MockCluster) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("charts.yaml"), DEMO_CHARTS).unwrap();
        let settings = test_settings(dir.path());
        let cancel = CancellationToken::new();
        let controller = LifecycleController::new(
            settings,
            Collaborators::uniform(mock.clone()),
            cancel.clone(),
        );
        Self {
            dir,
            mock,
            controller,
            cancel,
        }
    }

    /// Write a config file into the scratch directory
    pub fn write_config(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Transient kind descriptors currently in the scratch directory
    pub fn topology_files(&self) -> Vec<PathBuf> {
        topology_files(self.dir.path())
    }
}

pub fn topology_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TOPOLOGY_FILE_PREFIX))
        })
        .collect()
}

/// Default settings with every file location inside `dir`
pub fn test_settings(dir: &Path) -> LifecycleSettings {
    LifecycleSettings {
        topology_dir: dir.to_path_buf(),
        charts_manifest: dir.join("charts.yaml"),
        kubeconfig_paths: vec![dir.join("kubeconfig")],
        kubeconfig: dir.join("kubeconfig"),
        chart_cache_dir: dir.join("cache"),
        ..Default::default()
    }
}

pub fn create_test_application(name: &str, namespace: &str, app_type: &str) -> Application {
    Application {
        name: name.to_string(),
        namespace: namespace.to_string(),
        replicas: 1,
        image: format!("registry.local/{}:latest", name),
        app_type: app_type.to_string(),
    }
}

pub fn create_test_config(applications: Vec<Application>) -> ClusterConfig {
    ClusterConfig {
        name: "demo".to_string(),
        nodes: NodesConfig {
            control_plane: 1,
            worker: 0,
        },
        applications,
    }
}
