//! Rendering of the per-site manifest files.
//!
//! Objects are described with `serde_json::json!`, converted into their
//! k8s-openapi type to catch shape errors early and written as one
//! multi-document YAML file per workload.
use crate::{
    Component, MANAGER, Result, SiteConfig, SiteLayout, Settings,
    component::{COMPONENT_LABEL, INSTANCE_LABEL, MANAGED_BY_LABEL, NAME_LABEL, VERSION_LABEL},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Secret};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::path::Path;

pub mod application;
pub mod database;
pub mod ingress;
pub mod scripts;

/// Everything a manifest depends on
#[derive(Clone, Copy, Debug)]
pub struct SiteContext<'a> {
    pub settings: &'a Settings,
    pub layout: &'a SiteLayout,
    pub config: &'a SiteConfig,
}

impl SiteContext<'_> {
    pub fn site(&self) -> &str {
        self.layout.namespace()
    }

    /// Labels of every object belonging to the component
    pub fn labels(&self, component: Component) -> Value {
        let mut labels = self.pod_labels(component);
        labels[VERSION_LABEL] = json!(self.config.version);
        labels
    }

    /// Labels of the pod template, without the version so a new version alone does not roll the pods
    pub fn pod_labels(&self, component: Component) -> Value {
        json!({
            "app": self.site(),
            "tier": component.tier(),
            NAME_LABEL: match component {
                Component::Database => "mysql",
                Component::Application => "wordpress",
            },
            INSTANCE_LABEL: self.site(),
            COMPONENT_LABEL: component.label(),
            MANAGED_BY_LABEL: MANAGER,
        })
    }

    /// Labels the service and deployment select on
    pub fn selector(&self, component: Component) -> Value {
        json!({
            "app": self.site(),
            "tier": component.tier(),
        })
    }

    pub fn pull_secrets(&self) -> Value {
        json!([{ "name": self.settings.registry.secret_name }])
    }

    /// Volume bound to a host directory, pinned to the configured nodes
    pub fn volume(&self, component: Component, name: &str, size: &str, path: &Path) -> Result<PersistentVolume> {
        let mut spec = json!({
            "capacity": { "storage": size },
            "volumeMode": "Filesystem",
            "accessModes": ["ReadWriteOnce"],
            "persistentVolumeReclaimPolicy": "Retain",
            "storageClassName": self.settings.storage_class,
        });
        if self.settings.nodes.is_empty() {
            spec["hostPath"] = json!({ "path": path, "type": "DirectoryOrCreate" });
        } else {
            spec["local"] = json!({ "path": path });
            spec["nodeAffinity"] = json!({
                "required": {
                    "nodeSelectorTerms": [{
                        "matchExpressions": [{
                            "key": "kubernetes.io/hostname",
                            "operator": "In",
                            "values": self.settings.nodes,
                        }]
                    }]
                }
            });
        }
        Ok(serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "PersistentVolume",
            "metadata": {
                "name": name,
                "labels": self.labels(component),
            },
            "spec": spec,
        }))?)
    }

    pub fn claim(&self, component: Component, name: &str, volume: &str, size: &str) -> Result<PersistentVolumeClaim> {
        Ok(serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "name": name,
                "namespace": self.site(),
                "labels": self.labels(component),
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "storageClassName": self.settings.storage_class,
                "resources": { "requests": { "storage": size } },
                "volumeName": volume,
            }
        }))?)
    }

    /// Opaque secret holding a single `password` key
    pub fn password_secret(&self, component: Component, name: &str, password: &str) -> Result<Secret> {
        Ok(serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": name,
                "namespace": self.site(),
                "labels": self.labels(component),
            },
            "type": "Opaque",
            "data": { "password": STANDARD.encode(password) },
        }))?)
    }
}

/// Ordered documents of one manifest file
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    documents: Vec<String>,
}

impl Manifest {
    pub fn new() -> Manifest {
        Manifest::default()
    }

    pub fn push<K: Serialize>(&mut self, object: &K) -> Result<()> {
        self.documents.push(serde_yaml::to_string(object)?);
        Ok(())
    }

    /// Check a json description against its typed object before adding it
    pub fn push_value<K: Serialize + DeserializeOwned>(&mut self, value: Value) -> Result<()> {
        let object: K = serde_json::from_value(value)?;
        self.push(&object)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn render(&self) -> String {
        self.documents.join("---\n")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        tracing::debug!("wrote {} documents to {}", self.len(), path.display());
        Ok(())
    }
}

/// Parse a rendered file back into json values
pub fn documents(content: &str) -> Result<Vec<Value>> {
    let mut docs = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(content) {
        let value = Value::deserialize(doc)?;
        if !value.is_null() {
            docs.push(value);
        }
    }
    Ok(docs)
}
