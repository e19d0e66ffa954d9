use clap::Args;
use common::{
    Settings,
    registry::RegistryCredentials,
    settings::Timings,
};
use std::{path::PathBuf, time::Duration};

#[derive(Args, Debug, Clone)]
#[group(id = "Settings")]
pub struct Parameters {
    /// Directory holding the generated manifests of every site
    #[arg(long = "sites-dir", env = "SITES_DIR", value_name = "SITES_DIR", default_value = "/opt/control/sites", global = true)]
    sites_dir: PathBuf,
    /// Host directory holding the volumes of every site
    #[arg(long = "volumes-dir", env = "VOLUMES_DIR", value_name = "VOLUMES_DIR", default_value = "/volumes", global = true)]
    volumes_dir: PathBuf,
    /// Domain the site hosts are built on
    #[arg(long = "domain", env = "DOMAIN", value_name = "DOMAIN", default_value = "example.org", global = true)]
    domain: String,
    /// Nodes local volumes are pinned to, hostPath volumes when empty
    #[arg(long = "nodes", env = "NODES", value_name = "NODES", value_delimiter = ',', global = true)]
    nodes: Vec<String>,
    #[arg(long = "storage-class", env = "STORAGE_CLASS", value_name = "STORAGE_CLASS", default_value = "local-storage", global = true)]
    storage_class: String,
    #[arg(long = "ingress-class", env = "INGRESS_CLASS", value_name = "INGRESS_CLASS", global = true)]
    ingress_class: Option<String>,
    /// Image registry the deployments pull from
    #[arg(long = "registry-server", env = "REGISTRY_SERVER", value_name = "REGISTRY_SERVER", default_value = "", global = true)]
    registry_server: String,
    #[arg(long = "registry-user", env = "REGISTRY_USER", value_name = "REGISTRY_USER", default_value = "", global = true)]
    registry_user: String,
    #[arg(long = "registry-password", env = "REGISTRY_PASSWORD", value_name = "REGISTRY_PASSWORD", default_value = "", hide_env_values = true, global = true)]
    registry_password: String,
    #[arg(long = "registry-email", env = "REGISTRY_EMAIL", value_name = "REGISTRY_EMAIL", default_value = "", global = true)]
    registry_email: String,
    /// Name of the pull secret created in every site namespace
    #[arg(long = "registry-secret", env = "REGISTRY_SECRET", value_name = "REGISTRY_SECRET", default_value = "registry-pull-secret", global = true)]
    registry_secret: String,
    #[arg(long = "db-image", env = "DB_IMAGE", value_name = "DB_IMAGE", default_value = "mysql:8.0", global = true)]
    db_image: String,
    /// WordPress image, init-site needs wp-cli and runuser in it
    #[arg(long = "app-image", env = "APP_IMAGE", value_name = "APP_IMAGE", default_value = "wordpress:6.5-apache", global = true)]
    app_image: String,
    #[arg(long = "admin-user", env = "ADMIN_USER", value_name = "ADMIN_USER", default_value = "admin", global = true)]
    admin_user: String,
    #[arg(long = "admin-email", env = "ADMIN_EMAIL", value_name = "ADMIN_EMAIL", default_value = "admin@example.org", global = true)]
    admin_email: String,
    /// Site manager account created by init-site
    #[arg(long = "manager-user", env = "MANAGER_USER", value_name = "MANAGER_USER", default_value = "manager", global = true)]
    manager_user: String,
    #[arg(long = "theme", env = "THEME", value_name = "THEME", default_value = "twentytwentyfour", global = true)]
    theme: String,
    /// WordPress option receiving the theme settings
    #[arg(long = "theme-option", env = "THEME_OPTION", value_name = "THEME_OPTION", default_value = "theme_settings", global = true)]
    theme_option: String,
    /// Seconds to wait after an apply before looking for the pod
    #[arg(long = "settle", env = "SETTLE_SECONDS", value_name = "SECONDS", default_value_t = 15, global = true)]
    settle: u64,
    /// Seconds between two readiness checks
    #[arg(long = "poll-interval", env = "POLL_INTERVAL", value_name = "SECONDS", default_value_t = 10, global = true)]
    poll_interval: u64,
    /// Seconds before a pod that is not ready is reported
    #[arg(long = "ready-timeout", env = "READY_TIMEOUT", value_name = "SECONDS", default_value_t = 600, global = true)]
    ready_timeout: u64,
}

impl Parameters {
    pub fn settings(&self) -> Settings {
        Settings {
            sites_dir: self.sites_dir.clone(),
            volumes_dir: self.volumes_dir.clone(),
            domain: self.domain.clone(),
            nodes: self.nodes.iter().filter(|n| !n.is_empty()).cloned().collect(),
            storage_class: self.storage_class.clone(),
            ingress_class: self.ingress_class.clone(),
            registry: RegistryCredentials {
                secret_name: self.registry_secret.clone(),
                server: self.registry_server.clone(),
                username: self.registry_user.clone(),
                password: self.registry_password.clone(),
                email: self.registry_email.clone(),
            },
            db_image: self.db_image.clone(),
            app_image: self.app_image.clone(),
            admin_user: self.admin_user.clone(),
            admin_email: self.admin_email.clone(),
            manager_user: self.manager_user.clone(),
            theme: self.theme.clone(),
            theme_option: self.theme_option.clone(),
            timings: Timings {
                settle: Duration::from_secs(self.settle),
                poll_interval: Duration::from_secs(self.poll_interval),
                ready_timeout: Duration::from_secs(self.ready_timeout),
            },
        }
    }
}
