//! Resource naming and on-disk layout of a site.
//!
//! Every identifier used against the cluster or the filesystem is derived here
//! from the site name, so the rest of the crate never formats a name by itself.
use crate::{Component, Error, Result};
use regex::Regex;
use std::{
    fmt,
    path::{Path, PathBuf},
};

lazy_static::lazy_static! {
    static ref SITE_NAME: Regex = Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$").unwrap();
}

/// Longest derived service name suffix is `-mysql-service`, services are limited to 63 chars
pub const MAX_SITE_NAME: usize = 63 - "-mysql-service".len();

pub const DB_SECRET: &str = "mysql-bd-secret-config";
pub const ADMIN_SECRET: &str = "wordpress-admin-secret-config";
pub const USER_SECRET: &str = "wordpress-user-secret-config";
pub const DB_SCRIPTS: &str = "mysql-opt-scripts";
pub const APP_SCRIPTS: &str = "wordpress-opt-scripts";

/// A validated site name, usable as a namespace and as a DNS label
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SiteName(String);

impl SiteName {
    pub fn new(name: &str) -> Result<SiteName> {
        if name.is_empty() {
            return Err(Error::InvalidSiteName(name.to_string(), "name is empty".to_string()));
        }
        if name.len() > MAX_SITE_NAME {
            return Err(Error::InvalidSiteName(
                name.to_string(),
                format!("name is longer than {MAX_SITE_NAME} characters"),
            ));
        }
        if !SITE_NAME.is_match(name) {
            return Err(Error::InvalidSiteName(
                name.to_string(),
                "only lowercase letters, digits and '-' are allowed, starting with a letter".to_string(),
            ));
        }
        Ok(SiteName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roots of the persisted layout, shared by every site
#[derive(Clone, Debug)]
pub struct Layout {
    pub sites_dir: PathBuf,
    pub volumes_dir: PathBuf,
}

impl Layout {
    pub fn new(sites_dir: impl Into<PathBuf>, volumes_dir: impl Into<PathBuf>) -> Layout {
        Layout {
            sites_dir: sites_dir.into(),
            volumes_dir: volumes_dir.into(),
        }
    }

    pub fn site(&self, site: &SiteName) -> SiteLayout {
        SiteLayout {
            site: site.clone(),
            manifest_dir: self.sites_dir.join(site.as_str()),
            volume_root: self.volumes_dir.join(site.as_str()),
        }
    }
}

/// Every name and path of one site
#[derive(Clone, Debug)]
pub struct SiteLayout {
    site: SiteName,
    manifest_dir: PathBuf,
    volume_root: PathBuf,
}

impl SiteLayout {
    pub fn site(&self) -> &SiteName {
        &self.site
    }

    pub fn namespace(&self) -> &str {
        self.site.as_str()
    }

    // Cluster scoped, hence prefixed by the site name
    pub fn db_data_pv(&self) -> String {
        format!("{}-bd-data-pv", self.site)
    }

    pub fn db_dump_pv(&self) -> String {
        format!("{}-bd-dump-pv", self.site)
    }

    pub fn app_data_pv(&self) -> String {
        format!("{}-wp-data-pv", self.site)
    }

    pub fn app_dump_pv(&self) -> String {
        format!("{}-wp-dump-pv", self.site)
    }

    pub fn db_data_pvc(&self) -> &'static str {
        "bd-data-pvc"
    }

    pub fn db_dump_pvc(&self) -> &'static str {
        "bd-dump-pvc"
    }

    pub fn app_data_pvc(&self) -> &'static str {
        "wp-data-pvc"
    }

    pub fn app_dump_pvc(&self) -> &'static str {
        "wp-dump-pvc"
    }

    /// Claims in teardown order
    pub fn claims(&self) -> [&'static str; 4] {
        [
            self.db_data_pvc(),
            self.app_data_pvc(),
            self.db_dump_pvc(),
            self.app_dump_pvc(),
        ]
    }

    /// Volumes in teardown order
    pub fn volumes(&self) -> [String; 4] {
        [
            self.app_data_pv(),
            self.db_data_pv(),
            self.db_dump_pv(),
            self.app_dump_pv(),
        ]
    }

    pub fn db_service(&self) -> String {
        format!("{}-mysql-service", self.site)
    }

    pub fn app_service(&self) -> String {
        format!("{}-wp-service", self.site)
    }

    pub fn deployment(&self, component: Component) -> String {
        format!("{}-{}", self.site, component.marker())
    }

    pub fn ingress(&self) -> String {
        format!("{}-ingress", self.site)
    }

    pub fn host(&self, domain: &str) -> String {
        format!("{}.{}", self.site, domain.trim_start_matches('.'))
    }

    pub fn manifest_dir(&self) -> &Path {
        &self.manifest_dir
    }

    pub fn database_manifest(&self, version: &str) -> PathBuf {
        self.manifest_dir.join(format!("{}-bd-{}.yaml", self.site, version))
    }

    pub fn application_manifest(&self, version: &str) -> PathBuf {
        self.manifest_dir.join(format!("{}-wp-{}.yaml", self.site, version))
    }

    pub fn ingress_manifest(&self) -> PathBuf {
        self.manifest_dir.join(format!("{}-ingress.yaml", self.site))
    }

    pub fn volume_root(&self) -> &Path {
        &self.volume_root
    }

    pub fn db_data_dir(&self) -> PathBuf {
        self.volume_root.join("bd").join("data")
    }

    pub fn db_dump_dir(&self) -> PathBuf {
        self.volume_root.join("bd").join("dump")
    }

    pub fn app_uploads_dir(&self) -> PathBuf {
        self.volume_root.join("wp").join("uploads")
    }

    pub fn app_dump_dir(&self) -> PathBuf {
        self.volume_root.join("wp").join("dump")
    }

    pub fn dump_dir(&self, component: Component) -> PathBuf {
        match component {
            Component::Database => self.db_dump_dir(),
            Component::Application => self.app_dump_dir(),
        }
    }

    pub fn storage_dirs(&self) -> [PathBuf; 4] {
        [
            self.db_data_dir(),
            self.db_dump_dir(),
            self.app_uploads_dir(),
            self.app_dump_dir(),
        ]
    }
}

/// Version tags end up in file names
pub fn validate_version(version: &str) -> std::result::Result<(), String> {
    if version.is_empty() {
        Err("version is empty".to_string())
    } else if version.contains(['/', '\\']) || version == "." || version == ".." {
        Err(format!("version {version:?} is not usable in a file name"))
    } else {
        Ok(())
    }
}
