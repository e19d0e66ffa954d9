use crate::{
    Error, MANAGER, Result,
    gateway::{ApplyOutcome, ClusterGateway, DeleteTarget, ExecOutput, PodCondition, PodInfo, ResourceKind},
    manifests,
};
use async_trait::async_trait;
use futures::{AsyncBufReadExt, TryStreamExt};
use k8s_openapi::{
    NamespaceResourceScope,
    api::{
        apps::v1::Deployment,
        core::v1::{Namespace, PersistentVolume, PersistentVolumeClaim, Pod, Secret, Service},
    },
    apimachinery::pkg::apis::meta::v1::Status,
};
use kube::{
    Client, Resource, ResourceExt,
    api::{
        Api, AttachParams, DeleteParams, DynamicObject, GroupVersionKind, ListParams, LogParams, Patch,
        PatchParams, PostParams,
    },
    discovery::{self, Scope},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::{fmt::Debug, io::Write, path::Path, pin::pin};
use tokio::io::AsyncReadExt;

/// Cluster access through the kube API
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub fn new(client: Client) -> KubeGateway {
        KubeGateway { client }
    }

    pub async fn try_default() -> Result<KubeGateway> {
        Ok(KubeGateway::new(Client::try_default().await?))
    }

    async fn apply_one(&self, object: DynamicObject, namespace: &str) -> Result<bool> {
        let types = object
            .types
            .clone()
            .ok_or_else(|| Error::Other(format!("object {} has no apiVersion/kind", object.name_any())))?;
        let (group, version) = match types.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", types.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &types.kind);
        let (resource, caps) = discovery::pinned_kind(&self.client, &gvk).await?;
        let name = object.name_any();
        let api: Api<DynamicObject> = if caps.scope == Scope::Cluster {
            Api::all_with(self.client.clone(), &resource)
        } else {
            let ns = object.namespace().unwrap_or_else(|| namespace.to_string());
            Api::namespaced_with(self.client.clone(), &ns, &resource)
        };
        let before = api.get_opt(&name).await?.and_then(|o| o.resource_version());
        let params = PatchParams::apply(MANAGER).force();
        let after = api.patch(&name, &params, &Patch::Apply(&object)).await?;
        tracing::debug!("applied {} {}", gvk.kind, name);
        Ok(before.is_none() || before != after.resource_version())
    }

    async fn delete_all<K>(&self, namespace: &str) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.delete_collection(&DeleteParams::background(), &ListParams::default())
            .await?;
        Ok(())
    }

    async fn delete_named<K>(&self, api: Api<K>, name: &str) -> Result<()>
    where
        K: Resource + Clone + DeserializeOwned + Debug,
    {
        match api.delete(name, &DeleteParams::background()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                tracing::info!("{name} is already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Exit code of an exec from its final status, 1 when the cluster gave none
fn exit_code(status: Option<Status>) -> i32 {
    match status {
        Some(s) if s.status.as_deref() == Some("Success") => 0,
        Some(s) => s
            .details
            .and_then(|d| d.causes)
            .unwrap_or_default()
            .into_iter()
            .find(|c| c.reason.as_deref() == Some("ExitCode"))
            .and_then(|c| c.message)
            .and_then(|m| m.parse().ok())
            .unwrap_or(1),
        None => 1,
    }
}

/// Outcome of a whole manifest once every document was attempted
fn apply_outcome(manifest: &Path, changed: bool, failures: Vec<String>) -> Result<ApplyOutcome> {
    if !failures.is_empty() {
        return Err(Error::Other(format!(
            "applying {} failed for {} document(s): {}",
            manifest.display(),
            failures.len(),
            failures.join("; ")
        )));
    }
    Ok(if changed {
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Unchanged
    })
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn namespace_exists(&self, name: &str) -> Result<bool> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?.is_some())
    }

    async fn create_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let ns: Namespace = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": name }
        }))?;
        match api.create(&PostParams::default(), &ns).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?.is_some())
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.create(&PostParams::default(), secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 409 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn apply(&self, manifest: &Path, namespace: &str) -> Result<ApplyOutcome> {
        let content = std::fs::read_to_string(manifest)?;
        let mut changed = false;
        let mut failures = Vec::new();
        for (index, value) in manifests::documents(&content)?.into_iter().enumerate() {
            let what = format!(
                "#{index} {} {}",
                value["kind"].as_str().unwrap_or("?"),
                value["metadata"]["name"].as_str().unwrap_or("?")
            );
            let res = match serde_json::from_value::<DynamicObject>(value) {
                Ok(object) => self.apply_one(object, namespace).await,
                Err(e) => Err(e.into()),
            };
            match res {
                Ok(c) => changed |= c,
                Err(e) => {
                    tracing::warn!("applying {what} from {} failed: {e}", manifest.display());
                    failures.push(format!("{what}: {e}"));
                }
            }
        }
        apply_outcome(manifest, changed, failures)
    }

    async fn delete(&self, target: &DeleteTarget) -> Result<()> {
        let client = self.client.clone();
        match target {
            DeleteTarget::All { kind, namespace } => match kind {
                ResourceKind::Deployment => self.delete_all::<Deployment>(namespace).await,
                ResourceKind::Service => self.delete_all::<Service>(namespace).await,
                ResourceKind::Pod => self.delete_all::<Pod>(namespace).await,
                ResourceKind::PersistentVolumeClaim => self.delete_all::<PersistentVolumeClaim>(namespace).await,
                ResourceKind::PersistentVolume | ResourceKind::Namespace => {
                    Err(Error::Other(format!("cannot delete every {} of a namespace", kind.plural())))
                }
            },
            DeleteTarget::Named { kind, name, namespace } => {
                let ns = namespace.as_deref().unwrap_or_default();
                match kind {
                    ResourceKind::Deployment => {
                        self.delete_named::<Deployment>(Api::namespaced(client, ns), name).await
                    }
                    ResourceKind::Service => self.delete_named::<Service>(Api::namespaced(client, ns), name).await,
                    ResourceKind::Pod => self.delete_named::<Pod>(Api::namespaced(client, ns), name).await,
                    ResourceKind::PersistentVolumeClaim => {
                        self.delete_named::<PersistentVolumeClaim>(Api::namespaced(client, ns), name)
                            .await
                    }
                    ResourceKind::PersistentVolume => {
                        self.delete_named::<PersistentVolume>(Api::all(client), name).await
                    }
                    ResourceKind::Namespace => self.delete_named::<Namespace>(Api::all(client), name).await,
                }
            }
        }
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>> {
        let mut pods: Vec<PodInfo> = self
            .pods(namespace)
            .list(&ListParams::default())
            .await?
            .into_iter()
            .map(|p| PodInfo {
                name: p.name_any(),
                labels: p.labels().clone(),
                created: p.metadata.creation_timestamp.as_ref().map(|t| t.0),
                terminating: p.metadata.deletion_timestamp.is_some(),
                phase: p.status.and_then(|s| s.phase),
            })
            .collect();
        pods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pods)
    }

    async fn pod_conditions(&self, namespace: &str, pod: &str) -> Result<Vec<PodCondition>> {
        let pod = self.pods(namespace).get(pod).await?;
        Ok(pod
            .status
            .and_then(|s| s.conditions)
            .unwrap_or_default()
            .into_iter()
            .map(|c| PodCondition {
                type_: c.type_,
                status: c.status,
                message: c.message,
            })
            .collect())
    }

    async fn exec(&self, namespace: &str, pod: &str, command: Vec<String>) -> Result<ExecOutput> {
        tracing::debug!("exec in {namespace}/{pod}: {}", command.join(" "));
        let params = AttachParams::default().stdin(false).stdout(true).stderr(true);
        let mut attached = self.pods(namespace).exec(pod, command, &params).await?;
        let mut stdout_reader = attached.stdout();
        let mut stderr_reader = attached.stderr();
        let read_out = async {
            let mut buf = Vec::new();
            if let Some(r) = stdout_reader.as_mut() {
                r.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let read_err = async {
            let mut buf = Vec::new();
            if let Some(r) = stderr_reader.as_mut() {
                r.read_to_end(&mut buf).await?;
            }
            Ok::<_, std::io::Error>(buf)
        };
        let (stdout, stderr) = tokio::join!(read_out, read_err);
        let status = match attached.take_status() {
            Some(status) => status.await,
            None => None,
        };
        attached
            .join()
            .await
            .map_err(|e| Error::Other(format!("exec in {pod} failed: {e}")))?;
        Ok(ExecOutput {
            status: exit_code(status),
            stdout: String::from_utf8_lossy(&stdout?).to_string(),
            stderr: String::from_utf8_lossy(&stderr?).to_string(),
        })
    }

    async fn delete_pod(&self, namespace: &str, pod: &str) -> Result<()> {
        self.pods(namespace).delete(pod, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn logs(&self, namespace: &str, pod: &str, out: &mut (dyn Write + Send)) -> Result<()> {
        let mut lines = pin!(self.pods(namespace).log_stream(pod, &LogParams::default()).await?.lines());
        while let Some(line) = lines.try_next().await? {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}
