//! Lifecycle error taxonomy
//!
//! Every failure carries the entity and operation it happened in. No variant
//! is retried anywhere in the engine.

use crate::naming::NameViolation;
use cluster_clients::ClientError;
use cluster_config::{ConfigError, UnknownApplicationType};
use std::path::PathBuf;
use thiserror::Error;

/// Status class of a failure, mirroring gRPC status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    InvalidArgument,
    FailedPrecondition,
    NotFound,
    AlreadyExists,
    Unavailable,
    Internal,
    Cancelled,
}

/// Errors that can occur while creating, deleting or validating a cluster
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Config file unreadable or malformed
    #[error("error parsing cluster config: {0}")]
    ConfigParse(#[source] ConfigError),

    /// A name does not follow the naming convention
    #[error("{subject} '{value}' does not follow naming convention: {reason}")]
    InvalidName {
        subject: &'static str,
        value: String,
        #[source]
        reason: NameViolation,
    },

    /// A structural validation rule was violated
    #[error("{0}")]
    FailedPrecondition(String),

    /// An application's image is not in the local image store
    #[error("image {image} for application {application} does not exist")]
    ImageNotFound {
        application: String,
        image: String,
        #[source]
        source: Option<ClientError>,
    },

    #[error("a cluster with name {0} already exists")]
    AlreadyExists(String),

    #[error("could not find cluster with name {0}")]
    NotFound(String),

    /// Cluster contexts could not be enumerated
    #[error("error checking if cluster {name} exists: {source}")]
    Oracle {
        name: String,
        #[source]
        source: ClientError,
    },

    #[error("error {operation} cluster {name}: {source}")]
    Provisioning {
        name: String,
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The orchestration API of a freshly provisioned cluster is unreachable
    #[error("error connecting to cluster {name} through context {context}: {source}")]
    Connect {
        name: String,
        context: String,
        #[source]
        source: ClientError,
    },

    #[error("error {operation} for application {application}: {source}")]
    Reconciliation {
        application: String,
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("unsupported type for application {application}: {source}")]
    UnsupportedApplicationType {
        application: String,
        #[source]
        source: UnknownApplicationType,
    },

    /// The default resource manifest could not be loaded
    #[error("error loading default resources from {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("error {operation} chart {chart}: {source}")]
    Install {
        chart: String,
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// The ambient cancellation token fired while an operation was in flight
    #[error("cancelled while {operation}")]
    Cancelled { operation: String },
}

impl LifecycleError {
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition(message.into())
    }

    pub fn code(&self) -> StatusCode {
        match self {
            Self::ConfigParse(_) => StatusCode::InvalidArgument,
            Self::InvalidName { .. }
            | Self::FailedPrecondition(_)
            | Self::UnsupportedApplicationType { .. } => StatusCode::FailedPrecondition,
            Self::ImageNotFound { .. } | Self::NotFound(_) => StatusCode::NotFound,
            Self::AlreadyExists(_) => StatusCode::AlreadyExists,
            Self::Oracle { .. } | Self::Connect { .. } => StatusCode::Unavailable,
            Self::Provisioning { .. }
            | Self::Reconciliation { .. }
            | Self::Manifest { .. }
            | Self::Install { .. } => StatusCode::Internal,
            Self::Cancelled { .. } => StatusCode::Cancelled,
        }
    }

    /// Process exit code, distinct per failure family
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigParse(_) => 2,
            Self::InvalidName { .. }
            | Self::FailedPrecondition(_)
            | Self::UnsupportedApplicationType { .. } => 3,
            Self::ImageNotFound { .. } => 4,
            Self::NotFound(_) => 5,
            Self::AlreadyExists(_) => 6,
            Self::Oracle { .. } => 7,
            Self::Provisioning { .. } => 8,
            Self::Connect { .. } | Self::Reconciliation { .. } => 9,
            Self::Manifest { .. } | Self::Install { .. } => 10,
            Self::Cancelled { .. } => 130,
        }
    }
}
