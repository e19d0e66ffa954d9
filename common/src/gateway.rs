//! Contract between the site logic and the cluster.
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use serde::Serialize;
use std::{collections::BTreeMap, fmt, io::Write, path::Path};

/// Result of applying a manifest file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Changed,
    Unchanged,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PodInfo {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub phase: Option<String>,
    pub created: Option<DateTime<Utc>>,
    /// Set once the pod has a deletion timestamp
    pub terminating: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PodCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub message: Option<String>,
}

pub fn is_ready(conditions: &[PodCondition]) -> bool {
    conditions.iter().any(|c| c.type_ == "Ready" && c.status == "True")
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Service,
    Pod,
    PersistentVolumeClaim,
    PersistentVolume,
    Namespace,
}

impl ResourceKind {
    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Deployment => "deployments",
            ResourceKind::Service => "services",
            ResourceKind::Pod => "pods",
            ResourceKind::PersistentVolumeClaim => "persistentvolumeclaims",
            ResourceKind::PersistentVolume => "persistentvolumes",
            ResourceKind::Namespace => "namespaces",
        }
    }
}

/// What a teardown step removes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Every object of a kind in a namespace
    All { kind: ResourceKind, namespace: String },
    /// One object, namespace is None for cluster scoped kinds
    Named {
        kind: ResourceKind,
        name: String,
        namespace: Option<String>,
    },
}

impl fmt::Display for DeleteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteTarget::All { kind, namespace } => write!(f, "{} --all -n {}", kind.plural(), namespace),
            DeleteTarget::Named {
                kind,
                name,
                namespace: Some(ns),
            } => write!(f, "{} {} -n {}", kind.plural(), name, ns),
            DeleteTarget::Named {
                kind,
                name,
                namespace: None,
            } => write!(f, "{} {}", kind.plural(), name),
        }
    }
}

#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn namespace_exists(&self, name: &str) -> Result<bool>;
    /// Creating an already existing namespace is not an error
    async fn create_namespace(&self, name: &str) -> Result<()>;
    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool>;
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()>;
    /// Apply every document of a manifest file, `namespace` is the default for namespaced objects
    async fn apply(&self, manifest: &Path, namespace: &str) -> Result<ApplyOutcome>;
    async fn delete(&self, target: &DeleteTarget) -> Result<()>;
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>>;
    async fn pod_conditions(&self, namespace: &str, pod: &str) -> Result<Vec<PodCondition>>;
    async fn exec(&self, namespace: &str, pod: &str, command: Vec<String>) -> Result<ExecOutput>;
    async fn delete_pod(&self, namespace: &str, pod: &str) -> Result<()>;
    /// Copy the current logs of the pod to `out`, line by line as they arrive
    async fn logs(&self, namespace: &str, pod: &str, out: &mut (dyn Write + Send)) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ready() {
        let cond = |t: &str, s: &str| PodCondition {
            type_: t.to_string(),
            status: s.to_string(),
            message: None,
        };
        assert!(!is_ready(&[]));
        assert!(!is_ready(&[cond("Ready", "False"), cond("PodScheduled", "True")]));
        assert!(is_ready(&[cond("PodScheduled", "True"), cond("Ready", "True")]));
    }

    #[test]
    fn test_delete_target_display() {
        let all = DeleteTarget::All {
            kind: ResourceKind::Deployment,
            namespace: "demo".into(),
        };
        assert_eq!(all.to_string(), "deployments --all -n demo");
        let pv = DeleteTarget::Named {
            kind: ResourceKind::PersistentVolume,
            name: "demo-bd-data-pv".into(),
            namespace: None,
        };
        assert_eq!(pv.to_string(), "persistentvolumes demo-bd-data-pv");
    }
}
