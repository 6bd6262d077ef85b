//! Skillet Configuration Types
//!
//! Data model shared by the skillet binary and the collaborator clients:
//! - `ClusterConfig`: the user-authored cluster descriptor (nodes + applications)
//! - `KindConfig`: the node-topology descriptor handed to the kind provisioner
//! - `DefaultResources`: the static list of Helm charts installed into every new cluster

pub mod charts;
pub mod cluster;
pub mod error;
pub mod kind;

pub use charts::*;
pub use cluster::*;
pub use error::ConfigError;
pub use kind::*;
