//! Application reconciliation
//!
//! Applications are deployed one at a time in declaration order. Each gets
//! its namespace ensured (created only if absent) and then its workload
//! created. Workload creation is not idempotent: an existing workload with the
//! same name fails the run.

use crate::cancel::guarded;
use crate::error::LifecycleError;
use cluster_clients::{OrchestrationClient, WorkloadKind, WorkloadSpec};
use cluster_config::{Application, ApplicationType};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Deploys configured applications through an orchestration client
pub struct ApplicationReconciler {
    client: Arc<dyn OrchestrationClient>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ApplicationReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationReconciler").finish_non_exhaustive()
    }
}

/// Build the workload descriptor for an application
pub fn workload_spec(app: &Application) -> Result<WorkloadSpec, LifecycleError> {
    let kind = match app.workload_type() {
        Ok(ApplicationType::Deployment) => WorkloadKind::Deployment {
            replicas: app.replicas,
        },
        Ok(ApplicationType::DaemonSet) => WorkloadKind::DaemonSet,
        Err(e) => {
            return Err(LifecycleError::UnsupportedApplicationType {
                application: app.name.clone(),
                source: e,
            });
        }
    };
    Ok(WorkloadSpec {
        name: app.name.clone(),
        namespace: app.namespace.clone(),
        image: app.image.clone(),
        kind,
    })
}

impl ApplicationReconciler {
    pub fn new(client: Arc<dyn OrchestrationClient>, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    /// Deploy every application, stopping at the first failure
    ///
    /// Applications deployed before a failure are left in place.
    pub async fn reconcile(&self, applications: &[Application]) -> Result<(), LifecycleError> {
        for app in applications {
            info!("Deploying application {}", app.name);
            self.reconcile_application(app).await?;
            info!("Successfully deployed application {}", app.name);
        }
        info!("Successfully deployed {} application(s)", applications.len());
        Ok(())
    }

    async fn reconcile_application(&self, app: &Application) -> Result<(), LifecycleError> {
        // Resolve the type first so an unsupported application touches nothing
        let spec = workload_spec(app)?;
        self.ensure_namespace(app).await?;
        self.create_workload(app, &spec).await
    }

    /// Create the application's namespace unless it already exists
    ///
    /// Returns whether a namespace was created.
    pub async fn ensure_namespace(&self, app: &Application) -> Result<bool, LifecycleError> {
        let namespace = &app.namespace;
        let exists = guarded(
            &self.cancel,
            &format!("checking namespace {}", namespace),
            self.client.namespace_exists(namespace),
        )
        .await?
        .map_err(|e| LifecycleError::Reconciliation {
            application: app.name.clone(),
            operation: "checking namespace",
            source: e,
        })?;

        if exists {
            debug!("Namespace {} already exists, skipping creation", namespace);
            return Ok(false);
        }

        info!("Creating namespace {}", namespace);
        guarded(
            &self.cancel,
            &format!("creating namespace {}", namespace),
            self.client.create_namespace(namespace),
        )
        .await?
        .map_err(|e| LifecycleError::Reconciliation {
            application: app.name.clone(),
            operation: "creating namespace",
            source: e,
        })?;
        Ok(true)
    }

    async fn create_workload(&self, app: &Application, spec: &WorkloadSpec) -> Result<(), LifecycleError> {
        let kind = match spec.kind {
            WorkloadKind::Deployment { .. } => ApplicationType::Deployment,
            WorkloadKind::DaemonSet => ApplicationType::DaemonSet,
        };
        info!("Creating {} {}/{}", kind, spec.namespace, spec.name);
        guarded(
            &self.cancel,
            &format!("creating {} {}", kind, spec.name),
            self.client.create_workload(spec),
        )
        .await?
        .map_err(|e| LifecycleError::Reconciliation {
            application: app.name.clone(),
            operation: "creating workload",
            source: e,
        })
    }
}
