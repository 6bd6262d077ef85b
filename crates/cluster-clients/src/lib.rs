//! Cluster Collaborator Clients
//!
//! Abstractions over the external systems the skillet lifecycle engine drives,
//! plus their production bindings.
//!
//! # Example
//!
//! ```no_run
//! use cluster_clients::{ContextRegistry, KubeconfigContexts, Provisioner, KindProvisioner};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let contexts = KubeconfigContexts::new("/home/me/.kube/config");
//! if !contexts.list_contexts().await?.contains("kind-demo") {
//!     KindProvisioner::default().create("demo", None).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Bindings
//!
//! - **Provisioner**: `kind` CLI
//! - **Context registry**: kubeconfig file
//! - **Orchestration API**: Kubernetes API via `kube`
//! - **Package installer**: `helm` CLI, chart archives fetched over HTTP
//! - **Image store**: `docker` CLI

pub mod command;
pub mod docker;
pub mod error;
pub mod helm;
pub mod kind;
pub mod kube_api;
pub mod kubeconfig;
#[path = "trait.rs"]
pub mod client_traits;
pub mod workload;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client_traits::*;
pub use docker::DockerImageStore;
pub use error::ClientError;
pub use helm::{ChartPackage, HelmInstaller};
pub use kind::KindProvisioner;
pub use kube_api::{KubeConnector, KubeOrchestrationClient};
pub use kubeconfig::KubeconfigContexts;
pub use workload::{WorkloadKind, WorkloadSpec};
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockCluster, MockOperation};
