//! In-memory collaborators for unit testing
//!
//! `MockCluster` implements every collaborator trait against shared in-memory
//! state and records each call in order, so tests can assert both the final
//! state and the exact call sequence. Operations can be made to fail with
//! [`MockCluster::fail_on`], or to never complete with [`MockCluster::stall_on`].
//!
//! The mock is organized into domain-specific modules:
//! - `provisioner.rs` - Provisioner and ContextRegistry
//! - `orchestration.rs` - OrchestrationConnector and OrchestrationClient
//! - `packages.rs` - PackageInstaller and ImageStore

mod orchestration;
mod packages;
mod provisioner;

use crate::error::ClientError;
use crate::workload::WorkloadSpec;
use cluster_config::KindConfig;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Context prefix kind uses when registering clusters
pub const KIND_CONTEXT_PREFIX: &str = "kind-";

/// A recorded collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListContexts,
    /// `topology` is the descriptor file content parsed at call time
    Provision {
        name: String,
        topology: Option<KindConfig>,
    },
    Deprovision {
        name: String,
        kubeconfig: PathBuf,
    },
    Connect {
        context: String,
    },
    GetNamespace {
        name: String,
    },
    CreateNamespace {
        name: String,
    },
    CreateWorkload {
        spec: WorkloadSpec,
    },
    InspectImage {
        image: String,
    },
    LocateChart {
        name: String,
    },
    LoadChart {
        path: PathBuf,
    },
    InstallChart {
        release: String,
        namespace: String,
        create_namespace: bool,
        context: String,
    },
}

/// Operations that can be forced to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    ListContexts,
    Provision,
    Deprovision,
    Connect,
    GetNamespace,
    CreateNamespace,
    CreateWorkload,
    InspectImage,
    LocateChart,
    LoadChart,
    InstallChart,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub(crate) contexts: BTreeSet<String>,
    pub(crate) namespaces: BTreeSet<String>,
    /// (namespace, name) -> spec
    pub(crate) workloads: BTreeMap<(String, String), WorkloadSpec>,
    pub(crate) images: BTreeSet<String>,
    /// release -> namespace
    pub(crate) releases: BTreeMap<String, String>,
    pub(crate) calls: Vec<MockCall>,
    pub(crate) failures: HashSet<MockOperation>,
    /// Fail only the n-th (0-based) call of an operation
    pub(crate) failures_at: HashSet<(MockOperation, usize)>,
    /// Operations that are recorded and then never complete
    pub(crate) stalls: HashSet<MockOperation>,
    pub(crate) counts: BTreeMap<String, usize>,
}

/// Recording fake for all collaborators
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    pub(crate) state: Arc<Mutex<MockState>>,
}

impl MockCluster {
    /// Create an empty mock: no contexts, no images, no namespaces
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only happens after a test already panicked
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register an existing kube context (for test setup)
    pub fn add_context(&self, context: impl Into<String>) {
        self.lock().contexts.insert(context.into());
    }

    /// Register a cluster as if kind had created it (for test setup)
    pub fn add_cluster(&self, name: &str) {
        self.add_context(format!("{}{}", KIND_CONTEXT_PREFIX, name));
    }

    /// Make an image available in the local store (for test setup)
    pub fn add_image(&self, image: impl Into<String>) {
        self.lock().images.insert(image.into());
    }

    /// Pre-create a namespace (for test setup)
    pub fn add_namespace(&self, name: impl Into<String>) {
        self.lock().namespaces.insert(name.into());
    }

    /// Make every call of `op` fail
    pub fn fail_on(&self, op: MockOperation) {
        self.lock().failures.insert(op);
    }

    /// Make only the `index`-th (0-based) call of `op` fail
    pub fn fail_on_call(&self, op: MockOperation, index: usize) {
        self.lock().failures_at.insert((op, index));
    }

    /// Make every call of `op` record itself and then wait forever
    ///
    /// Pair with a cancellation token to exercise in-flight cancellation.
    pub fn stall_on(&self, op: MockOperation) {
        self.lock().stalls.insert(op);
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&MockCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Calls that change external state
    pub fn mutations(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    MockCall::Provision { .. }
                        | MockCall::Deprovision { .. }
                        | MockCall::CreateNamespace { .. }
                        | MockCall::CreateWorkload { .. }
                        | MockCall::InstallChart { .. }
                )
            })
            .collect()
    }

    pub fn contexts(&self) -> BTreeSet<String> {
        self.lock().contexts.clone()
    }

    pub fn namespaces(&self) -> BTreeSet<String> {
        self.lock().namespaces.clone()
    }

    pub fn workload(&self, namespace: &str, name: &str) -> Option<WorkloadSpec> {
        self.lock()
            .workloads
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Installed releases, release -> namespace
    pub fn releases(&self) -> BTreeMap<String, String> {
        self.lock().releases.clone()
    }

    /// Record a call and apply configured failures
    pub(crate) fn record(&self, op: MockOperation, call: MockCall) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(call);
        let counter = state.counts.entry(format!("{:?}", op)).or_insert(0);
        let index = *counter;
        *counter += 1;
        if state.failures.contains(&op) || state.failures_at.contains(&(op, index)) {
            return Err(ClientError::command("mock", format!("injected {:?} failure", op)));
        }
        Ok(())
    }

    /// Never resolve if `op` was configured to stall
    pub(crate) async fn stall(&self, op: MockOperation) {
        let stalled = self.lock().stalls.contains(&op);
        if stalled {
            std::future::pending::<()>().await;
        }
    }
}
