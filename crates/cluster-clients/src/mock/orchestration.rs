//! Orchestration API for MockCluster
//!
//! Namespace creation conflicts and duplicate workloads return
//! `ClientError::AlreadyExists`, like the Kubernetes API's 409.

use super::{MockCall, MockCluster, MockOperation};
use crate::client_traits::{OrchestrationClient, OrchestrationConnector};
use crate::error::ClientError;
use crate::workload::WorkloadSpec;
use std::sync::Arc;

#[async_trait::async_trait]
impl OrchestrationConnector for MockCluster {
    async fn connect(&self, context: &str) -> Result<Arc<dyn OrchestrationClient>, ClientError> {
        self.record(
            MockOperation::Connect,
            MockCall::Connect {
                context: context.to_string(),
            },
        )?;
        if !self.lock().contexts.contains(context) {
            return Err(ClientError::NotFound(format!("context {}", context)));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait::async_trait]
impl OrchestrationClient for MockCluster {
    async fn namespace_exists(&self, name: &str) -> Result<bool, ClientError> {
        self.record(
            MockOperation::GetNamespace,
            MockCall::GetNamespace {
                name: name.to_string(),
            },
        )?;
        Ok(self.lock().namespaces.contains(name))
    }

    async fn create_namespace(&self, name: &str) -> Result<(), ClientError> {
        self.record(
            MockOperation::CreateNamespace,
            MockCall::CreateNamespace {
                name: name.to_string(),
            },
        )?;
        if !self.lock().namespaces.insert(name.to_string()) {
            return Err(ClientError::AlreadyExists(format!("namespace {}", name)));
        }
        Ok(())
    }

    async fn create_workload(&self, spec: &WorkloadSpec) -> Result<(), ClientError> {
        self.record(
            MockOperation::CreateWorkload,
            MockCall::CreateWorkload { spec: spec.clone() },
        )?;
        let mut state = self.lock();
        if !state.namespaces.contains(&spec.namespace) {
            return Err(ClientError::NotFound(format!("namespace {}", spec.namespace)));
        }
        let key = (spec.namespace.clone(), spec.name.clone());
        if state.workloads.contains_key(&key) {
            return Err(ClientError::AlreadyExists(format!(
                "workload {}/{}",
                spec.namespace, spec.name
            )));
        }
        state.workloads.insert(key, spec.clone());
        Ok(())
    }
}
