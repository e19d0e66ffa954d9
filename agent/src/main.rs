mod backup;
mod component;
mod context;
mod deploy;
mod init;
mod logs;
mod remove;
mod restart;
mod schema;
mod settings;
mod site;
mod status;
mod version;

use clap::{Parser, Subcommand};
use common::{Component, Error, Result};
use context::Context;
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    process,
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, Registry, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "sitectl", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Parameters {
    #[command(flatten)]
    pub settings: settings::Parameters,
    /// Also write the logs to this file
    #[arg(long = "log-file", env = "LOG_FILE", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy or update a site from its configuration file
    Deploy(deploy::Parameters),
    /// Delete every resource of a site
    RemoveDeployment(site::SiteParameters),
    /// Run the WordPress init scripts of a site
    InitSite(site::SiteParameters),
    /// Show the pods of a site with their conditions
    PodStatus(status::Parameters),
    /// List the pods of a site
    ListPods(status::Parameters),
    /// Delete the pods of a component so they get recreated
    RestartContainer(restart::Parameters),
    /// Print the logs of a component
    ShowLogs(restart::Parameters),
    /// Dump the database of a site
    RunDbBackup(site::SiteParameters),
    /// Archive the uploads of a site
    RunAppBackup(site::SiteParameters),
    /// List the database dumps of a site
    ListDbBackups(site::SiteParameters),
    /// List the uploads archives of a site
    ListAppBackups(site::SiteParameters),
    /// Load a database dump back
    RestoreDbBackup(backup::RestoreParameters),
    /// Extract an uploads archive back
    RestoreAppBackup(backup::RestoreParameters),
    /// Print the JSON schema of the site configuration file
    ConfigSchema,
    /// Print the version
    Version,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let logger = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_logger = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| Error::Other(format!("invalid log filter: {e}")))?;
    let collector = Registry::default().with(logger).with(file_logger).with(env_filter);
    tracing::subscriber::set_global_default(collector)
        .map_err(|e| Error::Other(format!("cannot install the logger: {e}")))
}

fn exit_on(what: &str, code: i32) -> impl FnOnce(Error) {
    move |e| {
        tracing::error!("{what} failed with: {e:}");
        process::exit(code)
    }
}

#[tokio::main]
async fn main() {
    let args = Parameters::parse();
    if let Err(e) = init_tracing(args.log_file.as_deref()) {
        eprintln!("{e}");
        process::exit(1)
    }
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling the current operation");
            interrupt.cancel();
        }
    });
    let ctx = Context::new(args.settings.settings(), cancel);
    match &args.command {
        Commands::Deploy(a) => deploy::run(a, &ctx).await.unwrap_or_else(exit_on("Deploying the site", 1)),
        Commands::RemoveDeployment(a) => remove::run(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Removing the site", 2)),
        Commands::InitSite(a) => init::run(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Initializing the site", 3)),
        Commands::PodStatus(a) => status::status(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Reading the pod status", 4)),
        Commands::ListPods(a) => status::pods(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Listing the pods", 4)),
        Commands::RestartContainer(a) => restart::run(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Restarting the container", 5)),
        Commands::ShowLogs(a) => logs::run(a, &ctx)
            .await
            .unwrap_or_else(exit_on("Reading the logs", 6)),
        Commands::RunDbBackup(a) => backup::run(a, Component::Database, &ctx)
            .await
            .unwrap_or_else(exit_on("Database backup", 7)),
        Commands::RunAppBackup(a) => backup::run(a, Component::Application, &ctx)
            .await
            .unwrap_or_else(exit_on("Uploads backup", 7)),
        Commands::ListDbBackups(a) => backup::list(a, Component::Database, &ctx)
            .unwrap_or_else(exit_on("Listing the database backups", 8)),
        Commands::ListAppBackups(a) => backup::list(a, Component::Application, &ctx)
            .unwrap_or_else(exit_on("Listing the uploads backups", 8)),
        Commands::RestoreDbBackup(a) => backup::restore(a, Component::Database, &ctx)
            .await
            .unwrap_or_else(exit_on("Database restore", 9)),
        Commands::RestoreAppBackup(a) => backup::restore(a, Component::Application, &ctx)
            .await
            .unwrap_or_else(exit_on("Uploads restore", 9)),
        Commands::ConfigSchema => schema::run().unwrap_or_else(exit_on("Generating the schema", 10)),
        Commands::Version => version::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentArg;
    use std::time::Duration;

    #[test]
    fn test_deploy_takes_one_config_file() {
        let args = Parameters::try_parse_from(["sitectl", "deploy", "demo.yaml"]).unwrap();
        match args.command {
            Commands::Deploy(d) => assert_eq!(d.config, PathBuf::from("demo.yaml")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(Parameters::try_parse_from(["sitectl", "deploy"]).is_err());
        assert!(Parameters::try_parse_from(["sitectl", "deploy", "a.yaml", "b.yaml"]).is_err());
    }

    #[test]
    fn test_component_aliases() {
        for (word, expected) in [
            ("bd", ComponentArg::Db),
            ("db", ComponentArg::Db),
            ("database", ComponentArg::Db),
            ("wordpress", ComponentArg::App),
            ("wp", ComponentArg::App),
            ("app", ComponentArg::App),
        ] {
            let args = Parameters::try_parse_from(["sitectl", "restart-container", "demo", word]).unwrap();
            match args.command {
                Commands::RestartContainer(r) => {
                    assert_eq!(r.site, "demo");
                    assert_eq!(r.component, expected);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(Parameters::try_parse_from(["sitectl", "show-logs", "demo", "redis"]).is_err());
    }

    #[test]
    fn test_command_names() {
        for argv in [
            vec!["sitectl", "remove-deployment", "demo"],
            vec!["sitectl", "init-site", "demo"],
            vec!["sitectl", "pod-status", "demo"],
            vec!["sitectl", "list-pods", "demo", "--json"],
            vec!["sitectl", "run-db-backup", "demo"],
            vec!["sitectl", "run-app-backup", "demo"],
            vec!["sitectl", "list-db-backups", "demo"],
            vec!["sitectl", "list-app-backups", "demo"],
            vec!["sitectl", "restore-db-backup", "demo", "demo-wordpress-DB-20240301123005.gz"],
            vec!["sitectl", "restore-app-backup", "demo", "demo-UPLOADS-WP-20240301123005.tgz"],
            vec!["sitectl", "config-schema"],
            vec!["sitectl", "version"],
        ] {
            assert!(Parameters::try_parse_from(argv.clone()).is_ok(), "{argv:?}");
        }
        assert!(Parameters::try_parse_from(["sitectl", "restore-db-backup", "demo"]).is_err());
        assert!(Parameters::try_parse_from(["sitectl", "upgrade", "demo"]).is_err());
        assert!(Parameters::try_parse_from(["sitectl"]).is_err());
    }

    #[test]
    fn test_settings_arguments() {
        let args = Parameters::try_parse_from([
            "sitectl",
            "init-site",
            "demo",
            "--domain",
            "sites.test",
            "--nodes",
            "node1,node2",
            "--ready-timeout",
            "30",
            "--settle",
            "0",
        ])
        .unwrap();
        let settings = args.settings.settings();
        assert_eq!(settings.domain, "sites.test");
        assert_eq!(settings.nodes, vec!["node1", "node2"]);
        assert_eq!(settings.timings.ready_timeout, Duration::from_secs(30));
        assert!(settings.timings.settle.is_zero());
        assert_eq!(settings.registry.secret_name, "registry-pull-secret");
    }
}
