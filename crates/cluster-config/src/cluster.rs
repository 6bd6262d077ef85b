//! Cluster descriptor
//!
//! The YAML file passed to `skillet create --file`. Counts are signed so that
//! negative values survive parsing and are rejected by validation with a
//! precise message instead of a generic YAML error.

use crate::error::ConfigError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Declarative description of a cluster and the applications deployed onto it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterConfig {
    /// Cluster name; the kube context becomes `kind-<name>`
    #[serde(default)]
    pub name: String,

    /// Node topology
    #[serde(default)]
    pub nodes: NodesConfig,

    /// Applications, deployed in declaration order
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Number of nodes per role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NodesConfig {
    /// Control-plane nodes (at least 1)
    #[serde(default)]
    pub control_plane: i32,

    /// Worker nodes (0 or more)
    #[serde(default)]
    pub worker: i32,
}

/// A single application workload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Application {
    /// Workload name, also used as container name and `app` label
    #[serde(default)]
    pub name: String,

    /// Namespace the workload is created in (created if absent)
    #[serde(default)]
    pub namespace: String,

    /// Replica count (ignored for daemonsets, but must still be at least 1)
    #[serde(default)]
    pub replicas: i32,

    /// Container image; must already be present in the local image store
    #[serde(default)]
    pub image: String,

    /// Workload kind: `deployment` or `daemonset`
    #[serde(default, rename = "type")]
    pub app_type: String,
}

/// Supported workload shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationType {
    /// Replica-counted workload
    Deployment,
    /// One instance per node
    DaemonSet,
}

impl ApplicationType {
    /// All accepted values of the `type` field
    pub const VARIANTS: [&'static str; 2] = ["deployment", "daemonset"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::DaemonSet => "daemonset",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an application's `type` is not one of [`ApplicationType::VARIANTS`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownApplicationType(pub String);

impl fmt::Display for UnknownApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "application type '{}' must be one of [{}]",
            self.0,
            ApplicationType::VARIANTS.join(", ")
        )
    }
}

impl std::error::Error for UnknownApplicationType {}

impl FromStr for ApplicationType {
    type Err = UnknownApplicationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deployment" => Ok(Self::Deployment),
            "daemonset" => Ok(Self::DaemonSet),
            other => Err(UnknownApplicationType(other.to_string())),
        }
    }
}

impl Application {
    /// Parse the `type` discriminator
    pub fn workload_type(&self) -> Result<ApplicationType, UnknownApplicationType> {
        self.app_type.parse()
    }
}

impl ClusterConfig {
    /// Read and parse a cluster descriptor from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_yaml::from_str(&data).map_err(|e| ConfigError::yaml(path, e))
    }

    /// JSON Schema describing the descriptor file
    pub fn json_schema() -> Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(ClusterConfig);
        serde_json::to_string_pretty(&schema)
    }
}
