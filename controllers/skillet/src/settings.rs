//! Engine settings
//!
//! Everything the lifecycle controller would otherwise read from globals:
//! naming prefixes, kind descriptor constants, and file locations.

use cluster_config::{KindConfig, KindNode};
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

/// Settings for one `LifecycleController`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Prefix kind puts in front of a cluster name to form its kube context
    pub context_prefix: String,
    /// Cluster name used when neither `--name` nor a config file is given
    pub default_cluster_name: String,
    pub control_plane_role: String,
    pub worker_role: String,
    pub kind_config_kind: String,
    pub kind_api_version: String,
    /// Directory the transient kind descriptor is written to during provisioning
    pub topology_dir: PathBuf,
    /// Default resource (Helm chart) manifest
    pub charts_manifest: PathBuf,
    /// kubeconfig files searched for contexts, merged in order
    pub kubeconfig_paths: Vec<PathBuf>,
    /// kubeconfig pruned on delete and handed to helm: the first of `kubeconfig_paths`
    pub kubeconfig: PathBuf,
    pub chart_cache_dir: PathBuf,
    /// `HELM_DRIVER` passed to helm
    pub helm_driver: Option<String>,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        let kubeconfig_paths = kubeconfig_paths(env::var_os("KUBECONFIG"), env::var("HOME").ok());
        Self {
            context_prefix: "kind-".to_string(),
            default_cluster_name: "kind".to_string(),
            control_plane_role: KindNode::CONTROL_PLANE_ROLE.to_string(),
            worker_role: KindNode::WORKER_ROLE.to_string(),
            kind_config_kind: KindConfig::DEFAULT_KIND.to_string(),
            kind_api_version: KindConfig::DEFAULT_API_VERSION.to_string(),
            topology_dir: PathBuf::from("."),
            charts_manifest: PathBuf::from("./charts/charts.yaml"),
            kubeconfig: kubeconfig_paths.first().cloned().unwrap_or_default(),
            kubeconfig_paths,
            chart_cache_dir: env::temp_dir().join("skillet-charts"),
            helm_driver: None,
        }
    }
}

impl LifecycleSettings {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(path) = env::var("SKILLET_CHARTS_MANIFEST") {
            settings.charts_manifest = PathBuf::from(path);
        }
        if let Ok(path) = env::var("SKILLET_TOPOLOGY_DIR") {
            settings.topology_dir = PathBuf::from(path);
        }
        if let Ok(path) = env::var("SKILLET_CHART_CACHE") {
            settings.chart_cache_dir = PathBuf::from(path);
        }
        settings.helm_driver = env::var("HELM_DRIVER").ok().filter(|d| !d.is_empty());
        settings
    }

    /// Replace the kubeconfig search list with the entries of a `KUBECONFIG`-style value
    pub fn set_kubeconfig(&mut self, value: &OsStr) {
        let paths: Vec<PathBuf> = env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if let Some(first) = paths.first() {
            self.kubeconfig = first.clone();
            self.kubeconfig_paths = paths;
        }
    }
}

/// Every entry of `KUBECONFIG`, else `~/.kube/config`
///
/// Never empty.
fn kubeconfig_paths(kubeconfig_env: Option<OsString>, home: Option<String>) -> Vec<PathBuf> {
    let paths: Vec<PathBuf> = kubeconfig_env
        .as_deref()
        .map(|v| {
            env::split_paths(v)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();
    if !paths.is_empty() {
        return paths;
    }
    let home = home.map_or_else(|| PathBuf::from(".kube"), |h| PathBuf::from(h).join(".kube"));
    vec![home.join("config")]
}
