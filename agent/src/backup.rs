use crate::{context::Context, site::SiteParameters};
use clap::Args;
use common::{Component, Result, SiteName, operations};

#[derive(Args, Debug)]
pub struct RestoreParameters {
    #[arg(value_name = "SITE")]
    pub site: String,
    /// Dump file name, as printed by the list commands
    #[arg(value_name = "FILE")]
    pub file: String,
}

pub async fn run(args: &SiteParameters, component: Component, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    let artifact = manager.run_backup(&args.site, component).await?;
    println!("{}", artifact.file_name());
    Ok(())
}

/// Reads the host dump directory, no cluster access needed
pub fn list(args: &SiteParameters, component: Component, ctx: &Context) -> Result<()> {
    let site = ctx.settings.layout().site(&SiteName::new(&args.site)?);
    for name in operations::list_backups(&site, component)? {
        println!("{name}");
    }
    Ok(())
}

pub async fn restore(args: &RestoreParameters, component: Component, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    manager.restore_backup(&args.site, component, &args.file).await?;
    println!("{} restored into {component} of {}", args.file, args.site);
    Ok(())
}
