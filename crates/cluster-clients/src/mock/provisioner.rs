//! Provisioner and context registry for MockCluster

use super::{KIND_CONTEXT_PREFIX, MockCall, MockCluster, MockOperation};
use crate::client_traits::{ContextRegistry, Provisioner};
use crate::error::ClientError;
use cluster_config::KindConfig;
use std::collections::BTreeSet;
use std::path::Path;

#[async_trait::async_trait]
impl Provisioner for MockCluster {
    async fn create(&self, name: &str, topology: Option<&Path>) -> Result<(), ClientError> {
        // Read the descriptor while the call is in flight, like kind would
        let topology = match topology {
            Some(path) => {
                let data = std::fs::read_to_string(path)?;
                Some(serde_yaml::from_str::<KindConfig>(&data)?)
            }
            None => None,
        };
        self.record(
            MockOperation::Provision,
            MockCall::Provision {
                name: name.to_string(),
                topology,
            },
        )?;
        self.stall(MockOperation::Provision).await;

        let context = format!("{}{}", KIND_CONTEXT_PREFIX, name);
        let mut state = self.lock();
        if !state.contexts.insert(context) {
            return Err(ClientError::AlreadyExists(format!("cluster {}", name)));
        }
        Ok(())
    }

    async fn delete(&self, name: &str, kubeconfig: &Path) -> Result<(), ClientError> {
        self.record(
            MockOperation::Deprovision,
            MockCall::Deprovision {
                name: name.to_string(),
                kubeconfig: kubeconfig.to_path_buf(),
            },
        )?;
        self.stall(MockOperation::Deprovision).await;
        let mut state = self.lock();
        state
            .contexts
            .remove(&format!("{}{}", KIND_CONTEXT_PREFIX, name));
        state.namespaces.clear();
        state.workloads.clear();
        state.releases.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContextRegistry for MockCluster {
    async fn list_contexts(&self) -> Result<BTreeSet<String>, ClientError> {
        self.record(MockOperation::ListContexts, MockCall::ListContexts)?;
        Ok(self.lock().contexts.clone())
    }
}
