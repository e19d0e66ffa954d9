use crate::{
    Component, Error, Result,
    gateway::{ClusterGateway, PodInfo, is_ready},
};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Pacing of a readiness wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
        }
    }
}

/// Poll the pod conditions until `Ready=True`.
///
/// Conditions are read again on every attempt. A failed read is logged and
/// counts as a not ready observation, only the deadline or the token end the wait.
pub async fn wait_ready(
    gateway: &dyn ClusterGateway,
    namespace: &str,
    pod: &str,
    policy: &WaitPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    let deadline = Instant::now() + policy.timeout;
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled(pod.to_string()));
        }
        attempt += 1;
        match gateway.pod_conditions(namespace, pod).await {
            Ok(conditions) if is_ready(&conditions) => {
                tracing::info!(namespace, pod, attempt, "pod is ready");
                return Ok(());
            }
            Ok(_) => tracing::info!(namespace, pod, attempt, "waiting for pod to become ready"),
            Err(e) => tracing::warn!(namespace, pod, attempt, "reading pod conditions failed: {e}"),
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(Error::Timeout(namespace.to_string(), pod.to_string(), policy.timeout));
        }
        let pause = policy.interval.min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled(pod.to_string())),
            _ = sleep(pause) => {}
        }
    }
}

/// Live pods of the namespace playing the component role, newest first.
///
/// Terminating pods are left out, a rollout keeps listing the old replica for a while.
pub async fn find_pods(
    gateway: &dyn ClusterGateway,
    site: &str,
    component: Component,
) -> Result<Vec<PodInfo>> {
    let mut pods: Vec<PodInfo> = gateway
        .list_pods(site)
        .await?
        .into_iter()
        .filter(|p| component.matches(site, p))
        .filter(|p| {
            if p.terminating {
                tracing::debug!(pod = %p.name, "skipping terminating pod");
            }
            !p.terminating
        })
        .collect();
    pods.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.name.cmp(&b.name)));
    Ok(pods)
}

/// First pod of the component, `PodNotFound` when there is none
pub async fn find_pod(gateway: &dyn ClusterGateway, site: &str, component: Component) -> Result<String> {
    find_pods(gateway, site, component)
        .await?
        .into_iter()
        .next()
        .map(|p| p.name)
        .ok_or_else(|| Error::PodNotFound(site.to_string(), component))
}
