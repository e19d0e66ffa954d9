//! In-memory cluster used by the tests
use crate::{
    Component, Error, Result,
    component::{COMPONENT_LABEL, INSTANCE_LABEL},
    gateway::{ApplyOutcome, ClusterGateway, DeleteTarget, ExecOutput, PodCondition, PodInfo, ResourceKind},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use k8s_openapi::api::core::v1::Secret;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    NamespaceExists(String),
    CreateNamespace(String),
    SecretExists(String),
    CreateSecret(String),
    Apply(PathBuf),
    Delete(DeleteTarget),
    ListPods(String),
    PodConditions { pod: String, ready: bool },
    Exec { pod: String, command: Vec<String> },
    DeletePod(String),
    Logs(String),
}

#[derive(Clone, Debug, Default)]
struct Readiness {
    ready_after: Option<u32>,
    failures: u32,
    reads: u32,
    good_reads: u32,
}

#[derive(Clone, Debug)]
struct Spawn {
    pattern: String,
    namespace: String,
    pod: String,
    component: Component,
}

#[derive(Default)]
struct State {
    namespaces: BTreeSet<String>,
    secrets: BTreeMap<(String, String), Secret>,
    pods: Vec<(String, PodInfo)>,
    readiness: HashMap<String, Readiness>,
    spawns: Vec<Spawn>,
    exec_responses: Vec<(String, ExecOutput)>,
    logs: HashMap<String, String>,
    failing: Vec<String>,
    applied: BTreeSet<PathBuf>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MockGateway {
    state: Mutex<State>,
}

impl MockGateway {
    pub fn new() -> MockGateway {
        MockGateway::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn check(&self, key: &str) -> Result<()> {
        self.with(|s| {
            if s.failing.iter().any(|f| key.contains(f.as_str())) {
                Err(Error::Other(format!("injected failure on {key}")))
            } else {
                Ok(())
            }
        })
    }

    pub fn add_namespace(&self, name: &str) {
        self.with(|s| s.namespaces.insert(name.to_string()));
    }

    pub fn add_pod(&self, namespace: &str, name: &str, component: Option<Component>) {
        let mut labels = BTreeMap::new();
        if let Some(c) = component {
            labels.insert(COMPONENT_LABEL.to_string(), c.label().to_string());
            labels.insert(INSTANCE_LABEL.to_string(), namespace.to_string());
        }
        let pod = PodInfo {
            name: name.to_string(),
            labels,
            phase: Some("Running".to_string()),
            created: None,
            terminating: false,
        };
        self.with(|s| {
            // pods added later are created later
            let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().map(|t| t + Duration::seconds(s.pods.len() as i64));
            s.pods.push((namespace.to_string(), PodInfo { created, ..pod }))
        });
    }

    pub fn set_created(&self, pod: &str, created: DateTime<Utc>) {
        self.with(|s| s.pods.iter_mut().filter(|(_, p)| p.name == pod).for_each(|(_, p)| p.created = Some(created)));
    }

    /// Pod got a deletion timestamp but is still listed
    pub fn terminate(&self, pod: &str) {
        self.with(|s| s.pods.iter_mut().filter(|(_, p)| p.name == pod).for_each(|(_, p)| p.terminating = true));
    }

    /// Pod reports Ready on the n-th successful condition read
    pub fn ready_after(&self, pod: &str, reads: u32) {
        self.with(|s| s.readiness.entry(pod.to_string()).or_default().ready_after = Some(reads));
    }

    /// The next `count` condition reads of the pod fail
    pub fn fail_condition_reads(&self, pod: &str, count: u32) {
        self.with(|s| s.readiness.entry(pod.to_string()).or_default().failures = count);
    }

    /// Applying a manifest whose path contains `pattern` starts a pod ready on first read
    pub fn spawn_on_apply(&self, pattern: &str, namespace: &str, pod: &str, component: Component) {
        self.with(|s| {
            s.spawns.push(Spawn {
                pattern: pattern.to_string(),
                namespace: namespace.to_string(),
                pod: pod.to_string(),
                component,
            })
        });
    }

    /// First exec whose joined command contains `pattern` gets this answer
    pub fn exec_response(&self, pattern: &str, output: ExecOutput) {
        self.with(|s| s.exec_responses.push((pattern.to_string(), output)));
    }

    pub fn set_logs(&self, pod: &str, logs: &str) {
        self.with(|s| s.logs.insert(pod.to_string(), logs.to_string()));
    }

    /// Every call whose `operation:detail` key contains `pattern` fails
    pub fn fail(&self, pattern: &str) {
        self.with(|s| s.failing.push(pattern.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with(|s| s.calls.clone())
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.with(|s| s.secrets.get(&(namespace.to_string(), name.to_string())).cloned())
    }

    pub fn applied(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Apply(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(t) => Some(t.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn execs(&self) -> Vec<(String, Vec<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec { pod, command } => Some((pod, command)),
                _ => None,
            })
            .collect()
    }

    pub fn condition_reads(&self, pod: &str) -> u32 {
        self.with(|s| s.readiness.get(pod).map(|r| r.reads).unwrap_or(0))
    }
}

#[async_trait]
impl ClusterGateway for MockGateway {
    async fn namespace_exists(&self, name: &str) -> Result<bool> {
        self.with(|s| s.calls.push(Call::NamespaceExists(name.to_string())));
        self.check(&format!("namespace_exists:{name}"))?;
        Ok(self.with(|s| s.namespaces.contains(name)))
    }

    async fn create_namespace(&self, name: &str) -> Result<()> {
        self.with(|s| s.calls.push(Call::CreateNamespace(name.to_string())));
        self.check(&format!("create_namespace:{name}"))?;
        self.add_namespace(name);
        Ok(())
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool> {
        self.with(|s| s.calls.push(Call::SecretExists(name.to_string())));
        self.check(&format!("secret_exists:{name}"))?;
        Ok(self.with(|s| s.secrets.contains_key(&(namespace.to_string(), name.to_string()))))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<()> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.with(|s| s.calls.push(Call::CreateSecret(name.clone())));
        self.check(&format!("create_secret:{name}"))?;
        self.with(|s| s.secrets.insert((namespace.to_string(), name), secret.clone()));
        Ok(())
    }

    async fn apply(&self, manifest: &Path, namespace: &str) -> Result<ApplyOutcome> {
        self.with(|s| s.calls.push(Call::Apply(manifest.to_path_buf())));
        self.check(&format!("apply:{}", manifest.display()))?;
        std::fs::metadata(manifest)?;
        let path = manifest.to_string_lossy().to_string();
        let spawned: Vec<Spawn> = self.with(|s| {
            s.spawns
                .iter()
                .filter(|sp| path.contains(&sp.pattern) && sp.namespace == namespace)
                .cloned()
                .collect()
        });
        for sp in spawned {
            let exists = self.with(|s| s.pods.iter().any(|(_, p)| p.name == sp.pod));
            if !exists {
                self.add_pod(&sp.namespace, &sp.pod, Some(sp.component));
                self.with(|s| {
                    s.readiness.entry(sp.pod.clone()).or_default().ready_after.get_or_insert(1);
                });
            }
        }
        let first = self.with(|s| s.applied.insert(manifest.to_path_buf()));
        Ok(if first {
            ApplyOutcome::Changed
        } else {
            ApplyOutcome::Unchanged
        })
    }

    async fn delete(&self, target: &DeleteTarget) -> Result<()> {
        self.with(|s| s.calls.push(Call::Delete(target.clone())));
        self.check(&format!("delete:{target}"))?;
        if let DeleteTarget::Named {
            kind: ResourceKind::Namespace,
            name,
            ..
        } = target
        {
            self.with(|s| {
                s.namespaces.remove(name);
                s.pods.retain(|(ns, _)| ns != name);
            });
        }
        Ok(())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>> {
        self.with(|s| s.calls.push(Call::ListPods(namespace.to_string())));
        self.check(&format!("list_pods:{namespace}"))?;
        Ok(self.with(|s| {
            s.pods
                .iter()
                .filter(|(ns, _)| ns == namespace)
                .map(|(_, p)| p.clone())
                .collect()
        }))
    }

    async fn pod_conditions(&self, _namespace: &str, pod: &str) -> Result<Vec<PodCondition>> {
        let observed = self.with(|s| {
            let r = s.readiness.entry(pod.to_string()).or_default();
            r.reads += 1;
            if r.failures > 0 {
                r.failures -= 1;
                None
            } else {
                r.good_reads += 1;
                Some(r.ready_after.is_some_and(|n| r.good_reads >= n))
            }
        });
        match observed {
            None => Err(Error::Other(format!("injected failure reading {pod}"))),
            Some(ready) => {
                self.with(|s| {
                    s.calls.push(Call::PodConditions {
                        pod: pod.to_string(),
                        ready,
                    })
                });
                Ok(vec![
                    PodCondition {
                        type_: "PodScheduled".to_string(),
                        status: "True".to_string(),
                        message: None,
                    },
                    PodCondition {
                        type_: "Ready".to_string(),
                        status: if ready { "True" } else { "False" }.to_string(),
                        message: None,
                    },
                ])
            }
        }
    }

    async fn exec(&self, _namespace: &str, pod: &str, command: Vec<String>) -> Result<ExecOutput> {
        let joined = command.join(" ");
        self.with(|s| {
            s.calls.push(Call::Exec {
                pod: pod.to_string(),
                command,
            })
        });
        self.check(&format!("exec:{pod}:{joined}"))?;
        Ok(self.with(|s| {
            s.exec_responses
                .iter()
                .find(|(pattern, _)| joined.contains(pattern.as_str()))
                .map(|(_, out)| out.clone())
                .unwrap_or_default()
        }))
    }

    async fn delete_pod(&self, _namespace: &str, pod: &str) -> Result<()> {
        self.with(|s| s.calls.push(Call::DeletePod(pod.to_string())));
        self.check(&format!("delete_pod:{pod}"))?;
        self.with(|s| s.pods.retain(|(_, p)| p.name != pod));
        Ok(())
    }

    async fn logs(&self, _namespace: &str, pod: &str, out: &mut (dyn Write + Send)) -> Result<()> {
        self.with(|s| s.calls.push(Call::Logs(pod.to_string())));
        self.check(&format!("logs:{pod}"))?;
        let logs = self.with(|s| s.logs.get(pod).cloned().unwrap_or_default());
        out.write_all(logs.as_bytes())?;
        Ok(())
    }
}
