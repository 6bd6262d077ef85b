//! kind provisioner binding

use crate::client_traits::Provisioner;
use crate::command;
use crate::error::ClientError;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Provisions clusters with the `kind` CLI
#[derive(Debug, Clone)]
pub struct KindProvisioner {
    binary: String,
}

impl KindProvisioner {
    /// Use a specific `kind` binary
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for KindProvisioner {
    fn default() -> Self {
        Self::new("kind")
    }
}

#[async_trait::async_trait]
impl Provisioner for KindProvisioner {
    async fn create(&self, name: &str, topology: Option<&Path>) -> Result<(), ClientError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["create", "cluster", "--name", name]);
        if let Some(path) = topology {
            cmd.arg("--config").arg(path);
        }
        info!("Creating kind cluster {}", name);
        command::run(cmd).await?;
        Ok(())
    }

    async fn delete(&self, name: &str, kubeconfig: &Path) -> Result<(), ClientError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["delete", "cluster", "--name", name, "--kubeconfig"])
            .arg(kubeconfig);
        info!("Deleting kind cluster {}", name);
        command::run(cmd).await?;
        Ok(())
    }
}
