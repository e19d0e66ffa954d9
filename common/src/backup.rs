//! Backup artifacts naming and the in-pod commands producing and consuming them.
use crate::{Component, Error, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use std::fmt;

lazy_static::lazy_static! {
    static ref PLAIN_FILE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
}

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
/// Marker line printed by the backup scripts
pub const OUTPUT_MARKER: &str = "backup-file:";
/// Mount point of the dump claim in both pods
pub const DUMP_MOUNT: &str = "/dump";
pub const UPLOADS_MOUNT: &str = "/var/www/html/wp-content/uploads";
pub const SCRIPTS_MOUNT: &str = "/opt/scripts";
pub const DB_NAME: &str = "wordpress";

pub fn extension(component: Component) -> &'static str {
    match component {
        Component::Database => ".gz",
        Component::Application => ".tgz",
    }
}

/// Part of the file name between the site and the timestamp
fn infix(component: Component) -> String {
    match component {
        Component::Database => format!("{DB_NAME}-DB"),
        Component::Application => "UPLOADS-WP".to_string(),
    }
}

pub fn script_name(component: Component) -> &'static str {
    match component {
        Component::Database => "backup_database.sh",
        Component::Application => "backup_uploads.sh",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupArtifact {
    pub site: String,
    pub component: Component,
    pub taken_at: NaiveDateTime,
}

impl BackupArtifact {
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}{}",
            self.site,
            infix(self.component),
            self.taken_at.format(TIMESTAMP_FORMAT),
            extension(self.component)
        )
    }

    pub fn parse(site: &str, component: Component, name: &str) -> Result<BackupArtifact> {
        let invalid = |why: &str| Error::InvalidBackup(name.to_string(), why.to_string());
        let ts = name
            .strip_prefix(&format!("{site}-{}-", infix(component)))
            .ok_or_else(|| invalid("unexpected prefix"))?
            .strip_suffix(extension(component))
            .ok_or_else(|| invalid("unexpected extension"))?;
        let taken_at =
            NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).map_err(|e| invalid(&e.to_string()))?;
        Ok(BackupArtifact {
            site: site.to_string(),
            component,
            taken_at,
        })
    }

    /// Find the artifact announced by a backup script
    pub fn from_script_output(site: &str, component: Component, stdout: &str) -> Result<BackupArtifact> {
        let name = stdout
            .lines()
            .rev()
            .find_map(|l| l.trim().strip_prefix(OUTPUT_MARKER))
            .map(str::trim)
            .ok_or_else(|| {
                Error::InvalidBackup(String::new(), "backup script did not report a file".to_string())
            })?;
        Self::parse(site, component, name)
    }
}

impl fmt::Display for BackupArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Restorable file names are plain names carrying the component extension
pub fn validate_restore_name(component: Component, name: &str) -> Result<()> {
    if !PLAIN_FILE.is_match(name) {
        return Err(Error::InvalidBackup(
            name.to_string(),
            "expected a plain file name of the dump directory".to_string(),
        ));
    }
    // `.tgz` also ends with `.gz`
    let matches = match component {
        Component::Database => name.ends_with(".gz") && !name.ends_with(".tgz"),
        Component::Application => name.ends_with(".tgz"),
    };
    if !matches {
        return Err(Error::InvalidBackup(
            name.to_string(),
            format!("{component} backups end with {}", extension(component)),
        ));
    }
    Ok(())
}

pub fn backup_command(component: Component) -> Vec<String> {
    vec![
        "/bin/bash".to_string(),
        format!("{SCRIPTS_MOUNT}/{}", script_name(component)),
    ]
}

/// Command restoring a validated file name
pub fn restore_command(component: Component, name: &str) -> Vec<String> {
    match component {
        Component::Database => vec![
            "bash".to_string(),
            "-c".to_string(),
            format!("zcat {DUMP_MOUNT}/{name} | mysql -u\"$MYSQL_USER\" -p\"$MYSQL_PASSWORD\" \"$MYSQL_DATABASE\""),
        ],
        Component::Application => vec![
            "tar".to_string(),
            "xzf".to_string(),
            format!("{DUMP_MOUNT}/{name}"),
            "-C".to_string(),
            UPLOADS_MOUNT.to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        let db = BackupArtifact {
            site: "demo".into(),
            component: Component::Database,
            taken_at: at(),
        };
        assert_eq!(db.file_name(), "demo-wordpress-DB-20240301123005.gz");
        let app = BackupArtifact {
            component: Component::Application,
            ..db
        };
        assert_eq!(app.file_name(), "demo-UPLOADS-WP-20240301123005.tgz");
        assert_eq!(
            BackupArtifact::parse("demo", Component::Application, &app.file_name()).unwrap(),
            app
        );
    }

    #[test]
    fn test_parse_rejects_other_site_or_component() {
        assert!(BackupArtifact::parse("other", Component::Database, "demo-wordpress-DB-20240301123005.gz").is_err());
        assert!(BackupArtifact::parse("demo", Component::Application, "demo-wordpress-DB-20240301123005.gz").is_err());
        assert!(BackupArtifact::parse("demo", Component::Database, "demo-wordpress-DB-2024.gz").is_err());
    }

    #[test]
    fn test_from_script_output() {
        let out = "01/03/2024 12:30:05 - dumping\nbackup-file: demo-wordpress-DB-20240301123005.gz\n";
        let a = BackupArtifact::from_script_output("demo", Component::Database, out).unwrap();
        assert_eq!(a.taken_at, at());
        assert!(BackupArtifact::from_script_output("demo", Component::Database, "nothing").is_err());
    }

    #[test]
    fn test_validate_restore_name() {
        assert!(validate_restore_name(Component::Database, "demo-wordpress-DB-20240301123005.gz").is_ok());
        assert!(validate_restore_name(Component::Database, "demo-UPLOADS-WP-20240301123005.tgz").is_err());
        assert!(validate_restore_name(Component::Application, "../etc/passwd.tgz").is_err());
        assert!(validate_restore_name(Component::Application, "a b.tgz").is_err());
        assert!(validate_restore_name(Component::Database, "x.gz; rm -rf /").is_err());
    }

    #[test]
    fn test_restore_commands() {
        let db = restore_command(Component::Database, "f.gz");
        assert_eq!(db[0], "bash");
        assert!(db[2].starts_with("zcat /dump/f.gz | mysql"));
        assert_eq!(
            restore_command(Component::Application, "f.tgz"),
            vec!["tar", "xzf", "/dump/f.tgz", "-C", "/var/www/html/wp-content/uploads"]
        );
    }
}
