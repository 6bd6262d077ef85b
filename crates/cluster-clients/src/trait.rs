//! Collaborator traits
//!
//! The lifecycle engine only depends on these traits. Production bindings live
//! next to this module; in-memory fakes are in `mock` (feature `test-util`).
//! All async methods must be `Send` to work with Tokio's work-stealing runtime.

use crate::error::ClientError;
use crate::helm::ChartPackage;
use crate::workload::WorkloadSpec;
use cluster_config::HelmChart;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Creates and destroys clusters
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    /// Create a cluster; `topology` points at a node-topology descriptor file,
    /// `None` lets the provisioner use its default topology
    async fn create(&self, name: &str, topology: Option<&Path>) -> Result<(), ClientError>;

    /// Delete a cluster, pruning its entry from the given kubeconfig
    async fn delete(&self, name: &str, kubeconfig: &Path) -> Result<(), ClientError>;
}

/// Enumerates registered cluster contexts
#[async_trait::async_trait]
pub trait ContextRegistry: Send + Sync {
    async fn list_contexts(&self) -> Result<BTreeSet<String>, ClientError>;
}

/// Orchestration API operations used by application reconciliation
#[async_trait::async_trait]
pub trait OrchestrationClient: Send + Sync {
    /// `Ok(false)` when the namespace does not exist
    async fn namespace_exists(&self, name: &str) -> Result<bool, ClientError>;
    async fn create_namespace(&self, name: &str) -> Result<(), ClientError>;
    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<(), ClientError>;
}

/// Builds an orchestration client for a kube context
///
/// Clients can only be built once the cluster exists, so the engine holds a
/// connector rather than a client.
#[async_trait::async_trait]
pub trait OrchestrationConnector: Send + Sync {
    async fn connect(&self, context: &str) -> Result<Arc<dyn OrchestrationClient>, ClientError>;
}

/// Locates, loads and installs Helm charts
#[async_trait::async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Resolve the chart to a local archive; relative paths are resolved against `base_dir`
    async fn locate(&self, chart: &HelmChart, base_dir: &Path) -> Result<PathBuf, ClientError>;

    async fn load(&self, archive: &Path) -> Result<ChartPackage, ClientError>;

    async fn install(
        &self,
        package: &ChartPackage,
        release: &str,
        namespace: &str,
        create_namespace: bool,
        kube_context: &str,
    ) -> Result<(), ClientError>;
}

/// Read-only view of the local container image store
#[async_trait::async_trait]
pub trait ImageStore: Send + Sync {
    /// `Ok(false)` when the image is not present locally
    async fn image_exists(&self, image: &str) -> Result<bool, ClientError>;
}
