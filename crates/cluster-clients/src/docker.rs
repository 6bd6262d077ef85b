//! Docker image store binding

use crate::client_traits::ImageStore;
use crate::command;
use crate::error::ClientError;
use tokio::process::Command;
use tracing::debug;

/// Queries the local Docker image store with `docker image inspect`
#[derive(Debug, Clone)]
pub struct DockerImageStore {
    binary: String,
}

impl DockerImageStore {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }
}

impl Default for DockerImageStore {
    fn default() -> Self {
        Self::new("docker")
    }
}

/// Docker reports a missing image on stderr with this prefix
fn is_missing_image(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("no such image") || lower.contains("no such object")
}

#[async_trait::async_trait]
impl ImageStore for DockerImageStore {
    async fn image_exists(&self, image: &str) -> Result<bool, ClientError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["image", "inspect", "--format", "{{.Id}}", image]);
        let (program, output) = command::output(cmd).await?;

        if output.status.success() {
            debug!("Image {} found locally", image);
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_image(&stderr) {
            debug!("Image {} not found locally", image);
            Ok(false)
        } else {
            Err(ClientError::command(program, command::failure_message(&output)))
        }
    }
}
