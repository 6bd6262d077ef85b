//! Node topology translation
//!
//! Turns the node counts of a cluster config into the kind `Cluster`
//! descriptor and manages the transient file kind reads it from.

use crate::settings::LifecycleSettings;
use cluster_config::{ConfigError, KindConfig, KindNode, NodesConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Control-plane nodes first, then workers
///
/// Negative counts produce no entries; validation rejects them upstream.
pub fn translate(nodes: &NodesConfig, settings: &LifecycleSettings) -> KindConfig {
    let control_planes = usize::try_from(nodes.control_plane).unwrap_or(0);
    let workers = usize::try_from(nodes.worker).unwrap_or(0);

    let nodes = std::iter::repeat_n(&settings.control_plane_role, control_planes)
        .chain(std::iter::repeat_n(&settings.worker_role, workers))
        .map(|role| KindNode::new(role.clone()))
        .collect();

    KindConfig {
        kind: settings.kind_config_kind.clone(),
        api_version: settings.kind_api_version.clone(),
        nodes,
    }
}

/// File name prefix of transient kind descriptors
pub const TOPOLOGY_FILE_PREFIX: &str = "kind-topology-";

/// A kind descriptor written to a fresh file, removed again when dropped
///
/// The file gets a unique name inside the target directory, so an existing
/// file there (such as the cluster config itself) is never overwritten.
#[derive(Debug)]
pub struct TopologyFile {
    path: PathBuf,
    file: Option<TempPath>,
}

#[derive(Debug, thiserror::Error)]
pub enum TopologyFileError {
    #[error(transparent)]
    Serialize(#[from] ConfigError),
    #[error("failed to write kind config in {dir}: {source}")]
    Write {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TopologyFile {
    pub fn write(dir: &Path, config: &KindConfig) -> Result<Self, TopologyFileError> {
        let yaml = config.to_yaml()?;
        let write_err = |source: std::io::Error| TopologyFileError::Write {
            dir: dir.to_path_buf(),
            source,
        };
        let mut file = tempfile::Builder::new()
            .prefix(TOPOLOGY_FILE_PREFIX)
            .suffix(".yaml")
            .tempfile_in(dir)
            .map_err(write_err)?;
        file.write_all(yaml.as_bytes()).map_err(write_err)?;
        let file = file.into_temp_path();
        debug!("Wrote kind config to {}", file.display());
        Ok(Self {
            path: file.to_path_buf(),
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TopologyFile {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        match file.close() {
            Ok(()) => debug!("Removed kind config {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove kind config {}: {}", self.path.display(), e),
        }
    }
}
