//! kind cluster descriptor
//!
//! Minimal subset of `kind.x-k8s.io/v1alpha4` `Cluster`: only the node list is
//! emitted, everything else is left to kind's defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Topology descriptor accepted by `kind create cluster --config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindConfig {
    pub kind: String,
    pub api_version: String,
    pub nodes: Vec<KindNode>,
}

/// One node of a kind cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindNode {
    pub role: String,
}

impl KindConfig {
    pub const DEFAULT_KIND: &'static str = "Cluster";
    pub const DEFAULT_API_VERSION: &'static str = "kind.x-k8s.io/v1alpha4";

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl KindNode {
    pub const CONTROL_PLANE_ROLE: &'static str = "control-plane";
    pub const WORKER_ROLE: &'static str = "worker";

    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}
