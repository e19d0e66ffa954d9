use std::{path::PathBuf, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YamlError: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("K8s error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Registering template failed with error: {0}")]
    HbsTemplateError(#[from] handlebars::TemplateError),
    #[error("Renderer error: {0}")]
    HbsRenderError(#[from] handlebars::RenderError),

    #[error("Stdio error {0}")]
    Stdio(#[from] std::io::Error),

    #[error("Invalid site name {0:?}: {1}")]
    InvalidSiteName(String, String),

    #[error("Invalid configuration {0}: {1}")]
    Config(PathBuf, String),

    #[error("No {1} pod found in namespace {0}")]
    PodNotFound(String, component::Component),

    #[error("Pod {1} in namespace {0} not ready after {2:?}")]
    Timeout(String, String, Duration),

    #[error("Waiting for pod {0} was cancelled")]
    Cancelled(String),

    #[error("Command `{0}` failed with exit code {1}: {2}")]
    CommandFailed(String, i32, String),

    #[error("No backups found in {0}")]
    NoBackups(PathBuf),

    #[error("Invalid backup file {0:?}: {1}")]
    InvalidBackup(String, String),

    #[error("Site {0} is locked by another operation holding {1}")]
    SiteLocked(String, PathBuf),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub mod backup;
pub mod component;
pub mod gateway;
pub mod k8sgateway;
pub mod layout;
pub mod lock;
pub mod manager;
pub mod manifests;
pub mod operations;
pub mod orchestrator;
pub mod readiness;
pub mod registry;
pub mod report;
pub mod settings;
pub mod siteconfig;

#[cfg(test)]
pub(crate) mod k8smock;

pub use component::Component;
pub use gateway::ClusterGateway;
pub use layout::{Layout, SiteLayout, SiteName};
pub use manager::SiteManager;
pub use report::{Report, StageStatus};
pub use settings::Settings;
pub use siteconfig::SiteConfig;

/// Field manager used for server-side apply
pub static MANAGER: &str = "sitectl";
pub static VERSION: &str = env!("CARGO_PKG_VERSION");
