use crate::{
    context::{Context, conclude},
    site::SiteParameters,
};
use common::Result;

pub async fn run(args: &SiteParameters, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    conclude(manager.teardown(&args.site).await?)
}
