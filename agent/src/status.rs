use crate::context::Context;
use clap::Args;
use common::Result;

#[derive(Args, Debug)]
pub struct Parameters {
    /// Site name, also its namespace
    #[arg(value_name = "SITE")]
    pub site: String,
    /// Print JSON instead of text
    #[arg(long = "json")]
    pub json: bool,
}

pub async fn pods(args: &Parameters, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    let pods = manager.list_pods(&args.site).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&pods)?);
        return Ok(());
    }
    for pod in pods {
        println!("{}\t{}", pod.name, pod.phase.as_deref().unwrap_or("Unknown"));
    }
    Ok(())
}

pub async fn status(args: &Parameters, ctx: &Context) -> Result<()> {
    let manager = ctx.manager().await?;
    let status = manager.pod_status(&args.site).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }
    for pod in status {
        let ready = if pod.ready { "ready" } else { "not ready" };
        println!(
            "{} ({}, {ready})",
            pod.pod.name,
            pod.pod.phase.as_deref().unwrap_or("Unknown")
        );
        for condition in pod.conditions {
            match condition.message {
                Some(message) => println!("  {}={}: {message}", condition.type_, condition.status),
                None => println!("  {}={}", condition.type_, condition.status),
            }
        }
    }
    Ok(())
}
