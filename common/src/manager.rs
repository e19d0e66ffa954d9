use crate::{
    Component, Error, Layout, Result, SiteLayout, SiteName, Settings,
    gateway::ClusterGateway,
    lock::SiteLock,
    readiness::{self, WaitPolicy},
};
use tokio_util::sync::CancellationToken;

/// Entry point of every site operation
pub struct SiteManager<G: ClusterGateway> {
    pub(crate) gateway: G,
    pub(crate) settings: Settings,
    pub(crate) layout: Layout,
    pub(crate) cancel: CancellationToken,
}

impl<G: ClusterGateway> SiteManager<G> {
    pub fn new(gateway: G, settings: Settings, cancel: CancellationToken) -> SiteManager<G> {
        let layout = settings.layout();
        SiteManager {
            gateway,
            settings,
            layout,
            cancel,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate a site name given on the command line
    pub fn site(&self, name: &str) -> Result<SiteLayout> {
        Ok(self.layout.site(&SiteName::new(name)?))
    }

    pub(crate) fn lock(&self, site: &SiteName) -> Result<SiteLock> {
        SiteLock::acquire(&self.layout.sites_dir, site)
    }

    pub(crate) fn wait_policy(&self) -> WaitPolicy {
        self.settings.wait_policy()
    }

    /// Pause between an apply and the pod lookup
    pub(crate) async fn settle(&self, what: &str) -> Result<()> {
        let delay = self.settings.timings.settle;
        if delay.is_zero() {
            return Ok(());
        }
        tracing::info!("waiting {delay:?} for {what} to start");
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled(what.to_string())),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    pub(crate) async fn find_pod(&self, site: &SiteLayout, component: Component) -> Result<String> {
        readiness::find_pod(&self.gateway, site.namespace(), component).await
    }

    pub(crate) async fn wait_ready(&self, site: &SiteLayout, pod: &str) -> Result<()> {
        readiness::wait_ready(&self.gateway, site.namespace(), pod, &self.wait_policy(), &self.cancel).await
    }
}
