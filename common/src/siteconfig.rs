use crate::{Error, Result, SiteName, layout::validate_version};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Description of one site, as written by the operator in the site file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Site name, used as namespace and host prefix
    pub name: String,
    /// Version tag of the manifests
    pub version: String,
    pub database_password: String,
    pub admin_password: String,
    /// Password of the site manager account
    pub user_password: String,
    pub user_email: String,
    pub title_line1: String,
    pub title_line2: String,
    pub entity_type: String,
}

/// The site file wraps the site under a `website` key
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
pub struct SiteFile {
    pub website: SiteConfig,
}

impl SiteConfig {
    /// Read a JSON or YAML site file, chosen on the extension
    pub fn load(path: &Path) -> Result<SiteConfig> {
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::Config(path.to_path_buf(), e.to_string()))?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        let file: SiteFile = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| Error::Config(path.to_path_buf(), e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| Error::Config(path.to_path_buf(), e.to_string()))?
        };
        file.website.validate().map_err(|e| Error::Config(path.to_path_buf(), e))?;
        Ok(file.website)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        SiteName::new(&self.name).map_err(|e| e.to_string())?;
        validate_version(&self.version)?;
        for (field, value) in [
            ("databasePassword", &self.database_password),
            ("adminPassword", &self.admin_password),
            ("userPassword", &self.user_password),
            ("userEmail", &self.user_email),
        ] {
            if value.is_empty() {
                return Err(format!("field `{field}` is empty"));
            }
        }
        Ok(())
    }

    pub fn site(&self) -> Result<SiteName> {
        SiteName::new(&self.name)
    }
}

/// JSON schema of the site file
pub fn schema() -> Result<String> {
    Ok(serde_json::to_string_pretty(&schema_for!(SiteFile))?)
}
