//! Cluster existence checks

use crate::cancel::guarded;
use crate::error::LifecycleError;
use cluster_clients::ContextRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Answers "is this cluster registered?" from the set of kube contexts
#[derive(Clone)]
pub struct ClusterOracle {
    registry: Arc<dyn ContextRegistry>,
    context_prefix: String,
}

impl std::fmt::Debug for ClusterOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterOracle")
            .field("context_prefix", &self.context_prefix)
            .finish_non_exhaustive()
    }
}

impl ClusterOracle {
    pub fn new(registry: Arc<dyn ContextRegistry>, context_prefix: impl Into<String>) -> Self {
        Self {
            registry,
            context_prefix: context_prefix.into(),
        }
    }

    /// Context a cluster named `name` is registered under
    pub fn context_for(&self, name: &str) -> String {
        format!("{}{}", self.context_prefix, name)
    }

    /// `Ok(false)` is a normal answer; errors only mean the contexts could not be listed
    pub async fn exists(&self, name: &str, cancel: &CancellationToken) -> Result<bool, LifecycleError> {
        let context = self.context_for(name);
        let contexts = guarded(cancel, "listing cluster contexts", self.registry.list_contexts())
            .await?
            .map_err(|e| LifecycleError::Oracle {
                name: name.to_string(),
                source: e,
            })?;
        let exists = contexts.contains(&context);
        debug!("Context {} registered: {}", context, exists);
        Ok(exists)
    }
}
