use crate::{
    component::ComponentArg,
    context::{Context, conclude},
};
use clap::Args;
use common::Result;

#[derive(Args, Debug)]
pub struct Parameters {
    #[arg(value_name = "SITE")]
    pub site: String,
    #[arg(value_name = "COMPONENT", value_enum)]
    pub component: ComponentArg,
}

pub async fn run(args: &Parameters, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    conclude(manager.restart_pod(&args.site, args.component.into()).await?)
}
