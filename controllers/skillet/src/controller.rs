//! Cluster lifecycle controller
//!
//! Drives the create and delete state machines:
//!
//! - Create: CheckingExistence → Validating → Provisioning →
//!   ReconcilingApplications → InstallingDefaultResources → Done. Validating and
//!   ReconcilingApplications only run when a config file is given.
//! - Delete: CheckingExistence → Deprovisioning → Done.
//!
//! Every collaborator call is awaited before the next one is issued. A failure
//! in any phase ends the run without rollback.

use crate::cancel::guarded;
use crate::error::LifecycleError;
use crate::installer::DefaultResourceInstaller;
use crate::oracle::ClusterOracle;
use crate::reconciler::ApplicationReconciler;
use crate::settings::LifecycleSettings;
use crate::topology::{translate, TopologyFile};
use crate::validate::{load_config, validate_config};
use cluster_clients::{
    ClientError, ContextRegistry, DockerImageStore, HelmInstaller, ImageStore, KindProvisioner,
    KubeConnector, KubeconfigContexts, OrchestrationConnector, PackageInstaller, Provisioner,
};
use cluster_config::ClusterConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// External systems the controller drives
#[derive(Clone)]
pub struct Collaborators {
    pub provisioner: Arc<dyn Provisioner>,
    pub contexts: Arc<dyn ContextRegistry>,
    pub orchestration: Arc<dyn OrchestrationConnector>,
    pub packages: Arc<dyn PackageInstaller>,
    pub images: Arc<dyn ImageStore>,
}

impl Collaborators {
    /// kind, kubeconfig, the Kubernetes API, helm and docker
    pub fn production(settings: &LifecycleSettings) -> Result<Self, ClientError> {
        let packages = HelmInstaller::new(&settings.chart_cache_dir)?
            .with_kubeconfig(settings.kubeconfig_paths.clone())
            .with_driver(settings.helm_driver.clone());
        Ok(Self {
            provisioner: Arc::new(KindProvisioner::default()),
            contexts: Arc::new(KubeconfigContexts::from_paths(settings.kubeconfig_paths.clone())),
            orchestration: Arc::new(KubeConnector::from_paths(settings.kubeconfig_paths.clone())),
            packages: Arc::new(packages),
            images: Arc::new(DockerImageStore::default()),
        })
    }

    /// Use one object for every collaborator
    #[cfg(test)]
    pub fn uniform<T>(collaborator: T) -> Self
    where
        T: Provisioner
            + ContextRegistry
            + OrchestrationConnector
            + PackageInstaller
            + ImageStore
            + Clone
            + 'static,
    {
        Self {
            provisioner: Arc::new(collaborator.clone()),
            contexts: Arc::new(collaborator.clone()),
            orchestration: Arc::new(collaborator.clone()),
            packages: Arc::new(collaborator.clone()),
            images: Arc::new(collaborator),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// What to create: a bare name, a config file, or both
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRequest {
    pub name: Option<String>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    LoadingConfig,
    CheckingExistence,
    Validating,
    Provisioning,
    ReconcilingApplications,
    InstallingDefaultResources,
    Done,
}

impl fmt::Display for CreatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::LoadingConfig => "loading config",
            Self::CheckingExistence => "checking existence",
            Self::Validating => "validating",
            Self::Provisioning => "provisioning",
            Self::ReconcilingApplications => "reconciling applications",
            Self::InstallingDefaultResources => "installing default resources",
            Self::Done => "done",
        };
        f.write_str(phase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    CheckingExistence,
    Deprovisioning,
    Done,
}

impl fmt::Display for DeletePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            Self::CheckingExistence => "checking existence",
            Self::Deprovisioning => "deprovisioning",
            Self::Done => "done",
        };
        f.write_str(phase)
    }
}

/// Creates, deletes and validates kind clusters
pub struct LifecycleController {
    settings: LifecycleSettings,
    collaborators: Collaborators,
    oracle: ClusterOracle,
    cancel: CancellationToken,
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl LifecycleController {
    pub fn new(
        settings: LifecycleSettings,
        collaborators: Collaborators,
        cancel: CancellationToken,
    ) -> Self {
        let oracle = ClusterOracle::new(
            collaborators.contexts.clone(),
            settings.context_prefix.clone(),
        );
        Self {
            settings,
            collaborators,
            oracle,
            cancel,
        }
    }

    /// Create a cluster, returning its name
    pub async fn create(&self, request: &CreateRequest) -> Result<String, LifecycleError> {
        let mut phase = CreatePhase::LoadingConfig;
        let result = self.run_create(request, &mut phase).await;
        match &result {
            Ok(name) => info!("Cluster {} created", name),
            Err(_) => debug!("Create stopped while {}", phase),
        }
        result
    }

    async fn run_create(
        &self,
        request: &CreateRequest,
        phase: &mut CreatePhase,
    ) -> Result<String, LifecycleError> {
        let mut config = match &request.config {
            Some(path) => {
                info!("Loading cluster config from {}", path.display());
                Some(load_config(path)?)
            }
            None => None,
        };
        let name = self.resolve_name(request.name.as_deref(), config.as_ref())?;
        if let Some(config) = config.as_mut() {
            config.name = name.clone();
        }

        *phase = CreatePhase::CheckingExistence;
        if self.oracle.exists(&name, &self.cancel).await? {
            return Err(LifecycleError::AlreadyExists(name));
        }

        match &config {
            Some(config) => {
                *phase = CreatePhase::Validating;
                validate_config(config, self.collaborators.images.as_ref(), &self.cancel).await?;

                *phase = CreatePhase::Provisioning;
                self.provision_from_config(config).await?;

                *phase = CreatePhase::ReconcilingApplications;
                self.reconcile_applications(config).await?;
            }
            None => {
                *phase = CreatePhase::Provisioning;
                self.provision(&name, None).await?;
            }
        }

        *phase = CreatePhase::InstallingDefaultResources;
        let installer = DefaultResourceInstaller::new(
            self.collaborators.packages.clone(),
            self.cancel.clone(),
        );
        installer
            .install_all(&self.settings.charts_manifest, &self.oracle.context_for(&name))
            .await?;

        *phase = CreatePhase::Done;
        Ok(name)
    }

    /// `--name` wins; the config's name is used otherwise. Both present and different is an error.
    ///
    /// An empty config name is passed through so validation reports it.
    fn resolve_name(
        &self,
        requested: Option<&str>,
        config: Option<&ClusterConfig>,
    ) -> Result<String, LifecycleError> {
        match (requested, config) {
            (Some(requested), Some(config))
                if !config.name.is_empty() && config.name != requested =>
            {
                Err(LifecycleError::failed_precondition(format!(
                    "cluster name {} does not match name {} in the config file",
                    requested, config.name
                )))
            }
            (Some(requested), _) => Ok(requested.to_string()),
            (None, Some(config)) => Ok(config.name.clone()),
            (None, None) => Ok(self.settings.default_cluster_name.clone()),
        }
    }

    async fn provision_from_config(&self, config: &ClusterConfig) -> Result<(), LifecycleError> {
        let topology = translate(&config.nodes, &self.settings);
        info!(
            "Creating cluster {} with {} node(s)",
            config.name,
            topology.nodes.len()
        );
        let file = TopologyFile::write(&self.settings.topology_dir, &topology).map_err(|e| {
            LifecycleError::Provisioning {
                name: config.name.clone(),
                operation: "writing topology for",
                source: Box::new(e),
            }
        })?;
        // `file` is dropped on every path out of here, removing it from disk
        self.provision(&config.name, Some(file.path())).await
    }

    async fn provision(&self, name: &str, topology: Option<&Path>) -> Result<(), LifecycleError> {
        if topology.is_none() {
            info!("Creating cluster {} with the default topology", name);
        }
        guarded(
            &self.cancel,
            &format!("creating cluster {}", name),
            self.collaborators.provisioner.create(name, topology),
        )
        .await?
        .map_err(|e| LifecycleError::Provisioning {
            name: name.to_string(),
            operation: "creating",
            source: Box::new(e),
        })
    }

    async fn reconcile_applications(&self, config: &ClusterConfig) -> Result<(), LifecycleError> {
        if config.applications.is_empty() {
            return Ok(());
        }
        let context = self.oracle.context_for(&config.name);
        let client = guarded(
            &self.cancel,
            &format!("connecting to {}", context),
            self.collaborators.orchestration.connect(&context),
        )
        .await?
        .map_err(|e| LifecycleError::Connect {
            name: config.name.clone(),
            context: context.clone(),
            source: e,
        })?;

        ApplicationReconciler::new(client, self.cancel.clone())
            .reconcile(&config.applications)
            .await
    }

    /// Delete a cluster, returning its name
    pub async fn delete(&self, name: Option<&str>) -> Result<String, LifecycleError> {
        let name = name.unwrap_or(&self.settings.default_cluster_name).to_string();
        let mut phase = DeletePhase::CheckingExistence;
        let result = self.run_delete(&name, &mut phase).await;
        match &result {
            Ok(()) => info!("Cluster {} deleted", name),
            Err(_) => debug!("Delete stopped while {}", phase),
        }
        result.map(|()| name)
    }

    async fn run_delete(&self, name: &str, phase: &mut DeletePhase) -> Result<(), LifecycleError> {
        if !self.oracle.exists(name, &self.cancel).await? {
            return Err(LifecycleError::NotFound(name.to_string()));
        }

        *phase = DeletePhase::Deprovisioning;
        info!("Deleting cluster {}", name);
        guarded(
            &self.cancel,
            &format!("deleting cluster {}", name),
            self.collaborators
                .provisioner
                .delete(name, &self.settings.kubeconfig),
        )
        .await?
        .map_err(|e| LifecycleError::Provisioning {
            name: name.to_string(),
            operation: "deleting",
            source: Box::new(e),
        })?;

        *phase = DeletePhase::Done;
        Ok(())
    }

    /// Load and validate a config file without touching any cluster
    pub async fn validate(&self, path: &Path) -> Result<ClusterConfig, LifecycleError> {
        let config = load_config(path)?;
        validate_config(&config, self.collaborators.images.as_ref(), &self.cancel).await?;
        Ok(config)
    }
}
