use crate::context::{Context, conclude};
use clap::Args;
use common::{Result, SiteConfig};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct Parameters {
    /// Site configuration file, JSON or YAML
    #[arg(value_name = "CONFIG_FILE")]
    pub config: PathBuf,
}

pub async fn run(args: &Parameters, ctx: &Context) -> Result<()> {
    let config = SiteConfig::load(&args.config)?;
    tracing::info!("deploying {} version {}", config.name, config.version);
    let manager = ctx.manager().await?;
    conclude(manager.deploy(&config).await?)
}
