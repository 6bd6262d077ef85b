//! Kubernetes API binding

use crate::client_traits::{OrchestrationClient, OrchestrationConnector};
use crate::error::ClientError;
use crate::kubeconfig::read_merged;
use crate::workload::{WorkloadKind, WorkloadSpec};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds kube clients from one or more kubeconfig files, merged in order
#[derive(Debug, Clone)]
pub struct KubeConnector {
    kubeconfig: Vec<PathBuf>,
}

impl KubeConnector {
    pub fn new(kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            kubeconfig: vec![kubeconfig.into()],
        }
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            kubeconfig: paths.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl OrchestrationConnector for KubeConnector {
    async fn connect(&self, context: &str) -> Result<Arc<dyn OrchestrationClient>, ClientError> {
        debug!("Connecting to context {} from {:?}", context, self.kubeconfig);
        let kubeconfig = read_merged(&self.kubeconfig)
            .await?
            .ok_or_else(|| ClientError::NotFound(format!("kubeconfig in {:?}", self.kubeconfig)))?;
        let options = KubeConfigOptions {
            context: Some(context.to_string()),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        let client = Client::try_from(config)?;
        Ok(Arc::new(KubeOrchestrationClient::new(client)))
    }
}

/// Orchestration client backed by a live Kubernetes API
#[derive(Clone)]
pub struct KubeOrchestrationClient {
    client: Client,
}

impl std::fmt::Debug for KubeOrchestrationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeOrchestrationClient").finish_non_exhaustive()
    }
}

impl KubeOrchestrationClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Map a create conflict to `AlreadyExists`, pass everything else through
fn map_create_error(err: kube::Error, what: String) -> ClientError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => ClientError::AlreadyExists(what),
        other => ClientError::Kube(other),
    }
}

#[async_trait::async_trait]
impl OrchestrationClient for KubeOrchestrationClient {
    async fn namespace_exists(&self, name: &str) -> Result<bool, ClientError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?.is_some())
    }

    async fn create_namespace(&self, name: &str) -> Result<(), ClientError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        api.create(&PostParams::default(), &namespace)
            .await
            .map_err(|e| map_create_error(e, format!("namespace {}", name)))?;
        info!("Created namespace {}", name);
        Ok(())
    }

    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<(), ClientError> {
        let pp = PostParams::default();
        match spec.kind {
            WorkloadKind::Deployment { .. } => {
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), &spec.namespace);
                api.create(&pp, &spec.to_deployment()).await.map_err(|e| {
                    map_create_error(e, format!("deployment {}/{}", spec.namespace, spec.name))
                })?;
            }
            WorkloadKind::DaemonSet => {
                let api: Api<DaemonSet> = Api::namespaced(self.client.clone(), &spec.namespace);
                api.create(&pp, &spec.to_daemonset()).await.map_err(|e| {
                    map_create_error(e, format!("daemonset {}/{}", spec.namespace, spec.name))
                })?;
            }
        }
        info!("Created workload {}/{}", spec.namespace, spec.name);
        Ok(())
    }
}
