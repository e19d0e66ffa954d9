use common::{Error, Report, Result, Settings, SiteManager, k8sgateway::KubeGateway};
use tokio_util::sync::CancellationToken;

/// State shared by every command of one invocation
pub struct Context {
    pub settings: Settings,
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(settings: Settings, cancel: CancellationToken) -> Context {
        Context { settings, cancel }
    }

    pub async fn manager(&self) -> Result<SiteManager<KubeGateway>> {
        let gateway = KubeGateway::try_default().await?;
        Ok(SiteManager::new(gateway, self.settings.clone(), self.cancel.clone()))
    }
}

/// Print the report and turn a failed one into an error
pub fn conclude(report: Report) -> Result<()> {
    println!("{report}");
    if report.is_ok() {
        Ok(())
    } else {
        Err(Error::Other(format!(
            "{} failed with {} error(s)",
            report.operation,
            report.errors().len()
        )))
    }
}
