//! Collaborator client errors

use thiserror::Error;

/// Errors that can occur when talking to kind, Kubernetes, Helm or Docker
#[derive(Debug, Error)]
pub enum ClientError {
    /// An external command ran but exited unsuccessfully
    #[error("{program} failed: {message}")]
    Command { program: String, message: String },

    /// An external command could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// kubeconfig could not be read or resolved
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// YAML serialization/deserialization error
    #[error("Serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl ClientError {
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }
}
