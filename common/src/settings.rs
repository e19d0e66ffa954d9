use crate::{Layout, readiness::WaitPolicy, registry::RegistryCredentials};
use std::{path::PathBuf, time::Duration};

/// Pauses of the deploy sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// Pause after an apply before looking for the pod
    pub settle: Duration,
    pub poll_interval: Duration,
    pub ready_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Timings {
            settle: Duration::from_secs(15),
            poll_interval: Duration::from_secs(10),
            ready_timeout: Duration::from_secs(600),
        }
    }
}

/// Cluster wide settings shared by every site
#[derive(Clone, Debug)]
pub struct Settings {
    pub sites_dir: PathBuf,
    pub volumes_dir: PathBuf,
    pub domain: String,
    /// Hostnames local volumes are pinned to, hostPath volumes when empty
    pub nodes: Vec<String>,
    pub storage_class: String,
    pub ingress_class: Option<String>,
    pub registry: RegistryCredentials,
    pub db_image: String,
    /// Must ship wp-cli and runuser for init-site
    pub app_image: String,
    pub admin_user: String,
    pub admin_email: String,
    pub manager_user: String,
    pub theme: String,
    pub theme_option: String,
    pub timings: Timings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            sites_dir: PathBuf::from("/opt/control/sites"),
            volumes_dir: PathBuf::from("/volumes"),
            domain: "example.org".to_string(),
            nodes: Vec::new(),
            storage_class: "local-storage".to_string(),
            ingress_class: None,
            registry: RegistryCredentials {
                secret_name: "registry-pull-secret".to_string(),
                ..RegistryCredentials::default()
            },
            db_image: "mysql:8.0".to_string(),
            app_image: "wordpress:6.5-apache".to_string(),
            admin_user: "admin".to_string(),
            admin_email: "admin@example.org".to_string(),
            manager_user: "manager".to_string(),
            theme: "twentytwentyfour".to_string(),
            theme_option: "theme_settings".to_string(),
            timings: Timings::default(),
        }
    }
}

impl Settings {
    pub fn layout(&self) -> Layout {
        Layout::new(&self.sites_dir, &self.volumes_dir)
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            interval: self.timings.poll_interval,
            timeout: self.timings.ready_timeout,
        }
    }
}
