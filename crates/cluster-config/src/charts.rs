//! Default resource manifest
//!
//! Static list of Helm charts applied to every cluster after provisioning.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level manifest (`charts/charts.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultResources {
    #[serde(default)]
    pub helm_charts: Vec<HelmChart>,
}

/// A chart to install
///
/// At least one of `url` or `tgz` must point at the chart archive:
/// - `tgz` alone: a local archive, relative to the manifest file
/// - `url` ending in `.tgz`: the archive itself
/// - any other `url`: a chart repository, resolved through its index; `tgz`
///   then pins the version (`<name>-<version>.tgz`)
///
/// An archive named `tgz` that already sits next to the manifest is always preferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmChart {
    /// Release name
    pub name: String,

    /// Target namespace (created if absent)
    pub namespace: String,

    /// Human-readable repository reference, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tgz: Option<String>,
}

impl DefaultResources {
    /// Read and parse the manifest from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        serde_yaml::from_str(&data).map_err(|e| ConfigError::yaml(path, e))
    }
}

impl HelmChart {
    /// Remote location of the chart archive, when `url` points straight at one
    pub fn archive_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| url.ends_with(".tgz"))
    }

    /// Chart repository to pull from when `url` is not an archive
    pub fn repository(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.ends_with(".tgz"))
    }

    /// Chart version encoded in the `tgz` file name
    pub fn version(&self) -> Option<&str> {
        let file_name = self.tgz.as_deref()?.rsplit('/').next()?;
        file_name
            .strip_suffix(".tgz")?
            .strip_prefix(self.name.as_str())?
            .strip_prefix('-')
            .filter(|v| !v.is_empty())
    }
}
