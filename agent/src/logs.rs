use crate::{context::Context, restart::Parameters};
use common::Result;

pub async fn run(args: &Parameters, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    let mut out = std::io::stdout();
    manager.stream_logs(&args.site, args.component.into(), &mut out).await
}
