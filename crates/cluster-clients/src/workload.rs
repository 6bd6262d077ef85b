//! Workload descriptors
//!
//! A `WorkloadSpec` is the orchestration-agnostic description the engine
//! submits; `to_deployment` / `to_daemonset` render it for the Kubernetes API.

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// Label key used for selector and pod template
pub const APP_LABEL: &str = "app";

/// Workload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    /// Fixed replica count
    Deployment { replicas: i32 },
    /// One pod per node
    DaemonSet,
}

/// A single-container workload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    pub namespace: String,
    pub image: String,
    pub kind: WorkloadKind,
}

impl WorkloadSpec {
    /// Selector and pod labels
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(APP_LABEL.to_string(), self.name.clone())])
    }

    fn metadata(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            namespace: Some(self.namespace.clone()),
            ..Default::default()
        }
    }

    fn selector(&self) -> LabelSelector {
        LabelSelector {
            match_labels: Some(self.labels()),
            ..Default::default()
        }
    }

    fn pod_template(&self) -> PodTemplateSpec {
        PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(self.labels()),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: self.name.clone(),
                    image: Some(self.image.clone()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }
    }

    /// Render as a Deployment; replicas default to 1 for per-node specs
    pub fn to_deployment(&self) -> Deployment {
        let replicas = match self.kind {
            WorkloadKind::Deployment { replicas } => replicas,
            WorkloadKind::DaemonSet => 1,
        };
        Deployment {
            metadata: self.metadata(),
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                selector: self.selector(),
                template: self.pod_template(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn to_daemonset(&self) -> DaemonSet {
        DaemonSet {
            metadata: self.metadata(),
            spec: Some(DaemonSetSpec {
                selector: self.selector(),
                template: self.pod_template(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
