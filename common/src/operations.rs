//! Day two operations on a deployed site.
use crate::{
    Component, Error, Report, Result, SiteLayout, SiteManager,
    backup::{self, BackupArtifact},
    gateway::{ClusterGateway, DeleteTarget, PodCondition, PodInfo, ResourceKind, is_ready},
    readiness,
};
use serde::Serialize;
use std::io::Write;

/// Pod of a site with its current conditions
#[derive(Serialize, Clone, Debug)]
pub struct PodStatus {
    pub pod: PodInfo,
    pub ready: bool,
    pub conditions: Vec<PodCondition>,
}

/// Deletions of a teardown, in execution order
pub fn teardown_targets(site: &SiteLayout) -> Vec<DeleteTarget> {
    let ns = site.namespace().to_string();
    let mut targets: Vec<DeleteTarget> = [ResourceKind::Deployment, ResourceKind::Service, ResourceKind::Pod]
        .into_iter()
        .map(|kind| DeleteTarget::All {
            kind,
            namespace: ns.clone(),
        })
        .collect();
    targets.extend(site.claims().into_iter().map(|name| DeleteTarget::Named {
        kind: ResourceKind::PersistentVolumeClaim,
        name: name.to_string(),
        namespace: Some(ns.clone()),
    }));
    targets.extend(site.volumes().into_iter().map(|name| DeleteTarget::Named {
        kind: ResourceKind::PersistentVolume,
        name,
        namespace: None,
    }));
    targets.push(DeleteTarget::Named {
        kind: ResourceKind::Namespace,
        name: ns,
        namespace: None,
    });
    targets
}

/// Every entry name of the component dump directory on the host, sorted
pub fn list_backups(site: &SiteLayout, component: Component) -> Result<Vec<String>> {
    let dir = site.dump_dir(component);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("cannot read {}: {e}", dir.display());
            return Err(Error::NoBackups(dir));
        }
    };
    let mut names = Vec::new();
    for entry in entries {
        names.push(entry?.file_name().to_string_lossy().to_string());
    }
    if names.is_empty() {
        return Err(Error::NoBackups(dir));
    }
    names.sort();
    Ok(names)
}

impl<G: ClusterGateway> SiteManager<G> {
    /// Delete every pod of the component so its deployment recreates them
    pub async fn restart_pod(&self, site: &str, component: Component) -> Result<Report> {
        let site = self.site(site)?;
        let ns = site.namespace();
        let pods = readiness::find_pods(&self.gateway, ns, component).await?;
        if pods.is_empty() {
            return Err(Error::PodNotFound(ns.to_string(), component));
        }
        let mut report = Report::new(&format!("restart {component} of {ns}"));
        for pod in pods {
            match self.gateway.delete_pod(ns, &pod.name).await {
                Ok(()) => report.ok(&pod.name, "deleted"),
                Err(e) => report.failed(&pod.name, e.to_string()),
            }
        }
        Ok(report)
    }

    /// Write the logs of the first pod of the component
    pub async fn stream_logs(
        &self,
        site: &str,
        component: Component,
        out: &mut (dyn Write + Send),
    ) -> Result<()> {
        let site = self.site(site)?;
        let pod = self.find_pod(&site, component).await?;
        self.gateway.logs(site.namespace(), &pod, out).await?;
        out.flush()?;
        tracing::debug!("displayed logs of {pod}");
        Ok(())
    }

    /// Run the component backup script in its pod
    pub async fn run_backup(&self, site: &str, component: Component) -> Result<BackupArtifact> {
        let site = self.site(site)?;
        let pod = self.find_pod(&site, component).await?;
        let command = backup::backup_command(component);
        let out = self.gateway.exec(site.namespace(), &pod, command.clone()).await?;
        if !out.success() {
            return Err(Error::CommandFailed(command.join(" "), out.status, out.stderr));
        }
        let artifact = BackupArtifact::from_script_output(site.namespace(), component, &out.stdout)?;
        tracing::info!("{component} backup of {} written to {artifact}", site.namespace());
        Ok(artifact)
    }

    /// File names of the component dump directory, sorted
    pub fn list_backups(&self, site: &str, component: Component) -> Result<Vec<String>> {
        list_backups(&self.site(site)?, component)
    }

    /// Load a dump file back into the component
    pub async fn restore_backup(&self, site: &str, component: Component, file: &str) -> Result<()> {
        let site = self.site(site)?;
        backup::validate_restore_name(component, file)?;
        let _lock = self.lock(site.site())?;
        let pod = self.find_pod(&site, component).await?;
        let command = backup::restore_command(component, file);
        let out = self.gateway.exec(site.namespace(), &pod, command.clone()).await?;
        if !out.success() {
            return Err(Error::CommandFailed(command.join(" "), out.status, out.stderr));
        }
        tracing::info!("restored {file} into {pod}");
        Ok(())
    }

    pub async fn list_pods(&self, site: &str) -> Result<Vec<PodInfo>> {
        let site = self.site(site)?;
        self.gateway.list_pods(site.namespace()).await
    }

    pub async fn pod_status(&self, site: &str) -> Result<Vec<PodStatus>> {
        let site = self.site(site)?;
        let mut status = Vec::new();
        for pod in self.gateway.list_pods(site.namespace()).await? {
            let conditions = self.gateway.pod_conditions(site.namespace(), &pod.name).await?;
            status.push(PodStatus {
                ready: is_ready(&conditions),
                pod,
                conditions,
            });
        }
        Ok(status)
    }

    /// Remove every resource of the site, each deletion attempted once whatever the previous outcome
    pub async fn teardown(&self, site: &str) -> Result<Report> {
        let site = self.site(site)?;
        let _lock = self.lock(site.site())?;
        let mut report = Report::new(&format!("teardown {}", site.site()));
        for target in teardown_targets(&site) {
            match self.gateway.delete(&target).await {
                Ok(()) => report.ok(&target.to_string(), "deleted"),
                Err(e) => report.failed(&target.to_string(), e.to_string()),
            }
        }
        Ok(report)
    }
}
