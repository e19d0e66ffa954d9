//! Shell scripts mounted in the pods from the scripts config maps
use crate::{
    Result,
    backup::{DUMP_MOUNT, OUTPUT_MARKER, SCRIPTS_MOUNT, UPLOADS_MOUNT},
};
use handlebars::{Handlebars, no_escape};
use serde_json::{Value, json};

pub const CHECK_DB: &str = "check_mysql.sh";
pub const BACKUP_DB: &str = "backup_database.sh";
pub const INIT_SITE: &str = "wordpress-wp-cli-init.sh";
pub const INIT_MANAGER: &str = "wordpress-wp-cli-manager.sh";
pub const THEME_SETTINGS: &str = "theme_settings_default.json";
pub const BACKUP_UPLOADS: &str = "backup_uploads.sh";

pub const MANAGER_ROLE: &str = "site_manager";
pub const MANAGER_CAPABILITIES: [&str; 9] = [
    "create_users",
    "list_users",
    "edit_users",
    "delete_users",
    "promote_users",
    "activate_plugins",
    "manage_options",
    "edit_theme_options",
    "wpml_manage_wp_menus_sync",
];

const CHECK_DB_TPL: &str = r#"#!/bin/bash
mysql -u"$MYSQL_USER" -p"$MYSQL_PASSWORD" -e "USE $MYSQL_DATABASE;"
"#;

const BACKUP_TPL: &str = r#"#!/bin/bash
set -eo pipefail
fileDt=$(date '+%Y%m%d%H%M%S')
backUpFileName="{{site}}-{{infix}}-$fileDt{{ext}}"
backUpFilePath="{{dump}}/$backUpFileName"
echo "$(date '+%d/%m/%Y %H:%M:%S') - {{what}} backup of {{site}} into $backUpFilePath"
if ! {{command}}; then
  rm -f "$backUpFilePath"
  echo "backup of {{site}} failed" >&2
  exit 1
fi
echo "$(date '+%d/%m/%Y %H:%M:%S') - {{what}} backup of {{site}} completed"
echo "{{marker}} $backUpFileName"
"#;

const INIT_SITE_TPL: &str = r#"#!/bin/bash
set -e
if ! command -v wp > /dev/null 2>&1; then
  echo "wp-cli is missing from the application image" >&2
  exit 127
fi
wp() { runuser -u www-data -- wp "$@"; }
echo "Installing site"
wp core install --url="$WORDPRESS_SITE_URL" --title="$WORDPRESS_SITE_NAME" --admin_user="$WORDPRESS_ADMIN_USER" --admin_password="$WORDPRESS_ADMIN_PASSWORD" --admin_email="$WORDPRESS_ADMIN_MAIL" --skip-email
echo "Activating theme {{theme}}"
wp theme activate "{{theme}}"
echo "Loading theme settings"
wp option update "{{theme_option}}" --format=json < "{{scripts}}/{{settings}}"
"#;

const INIT_MANAGER_TPL: &str = r#"#!/bin/bash
set -e
if ! command -v wp > /dev/null 2>&1; then
  echo "wp-cli is missing from the application image" >&2
  exit 127
fi
wp() { runuser -u www-data -- wp "$@"; }
echo "Creating role {{role}}"
wp role exists {{role}} || wp role create {{role}} 'Site manager' --clone=editor
echo "Granting capabilities to {{role}}"
wp cap add {{role}} {{capabilities}}
echo "Creating user $WORDPRESS_USER"
if ! wp user get "$WORDPRESS_USER" > /dev/null 2>&1; then
  wp user create "$WORDPRESS_USER" "$WORDPRESS_USER_MAIL" --role={{role}} --user_pass="$WORDPRESS_PASSWORD"
fi
"#;

fn render(template: &str, data: &Value) -> Result<String> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    Ok(hbs.render_template(template, data)?)
}

pub fn check_db() -> String {
    CHECK_DB_TPL.to_string()
}

pub fn backup_db(site: &str) -> Result<String> {
    render(
        BACKUP_TPL,
        &json!({
            "site": site,
            "infix": "$MYSQL_DATABASE-DB",
            "ext": ".gz",
            "dump": DUMP_MOUNT,
            "what": "database",
            "command": "mysqldump -uroot -p\"$MYSQL_ROOT_PASSWORD\" \"$MYSQL_DATABASE\" | gzip > \"$backUpFilePath\"",
            "marker": OUTPUT_MARKER,
        }),
    )
}

pub fn backup_uploads(site: &str) -> Result<String> {
    render(
        BACKUP_TPL,
        &json!({
            "site": site,
            "infix": "UPLOADS-WP",
            "ext": ".tgz",
            "dump": DUMP_MOUNT,
            "what": "uploads",
            "command": format!("tar czf \"$backUpFilePath\" -C {UPLOADS_MOUNT} ."),
            "marker": OUTPUT_MARKER,
        }),
    )
}

pub fn init_site(theme: &str, theme_option: &str) -> Result<String> {
    render(
        INIT_SITE_TPL,
        &json!({
            "theme": theme,
            "theme_option": theme_option,
            "scripts": SCRIPTS_MOUNT,
            "settings": THEME_SETTINGS,
        }),
    )
}

pub fn init_manager() -> Result<String> {
    render(
        INIT_MANAGER_TPL,
        &json!({
            "role": MANAGER_ROLE,
            "capabilities": MANAGER_CAPABILITIES.join(" "),
        }),
    )
}

/// Value loaded into the theme option
pub fn theme_settings(title_line1: &str, title_line2: &str, entity_type: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "titleLine1": title_line1,
        "titleLine2": title_line2,
        "description": "",
        "entityType": entity_type,
        "savedData": "YES",
    }))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_scripts_announce_their_file() {
        let db = backup_db("demo").unwrap();
        assert!(db.contains(r#"backUpFileName="demo-$MYSQL_DATABASE-DB-$fileDt.gz""#));
        assert!(db.contains(r#"mysqldump -uroot -p"$MYSQL_ROOT_PASSWORD""#));
        assert!(db.trim_end().ends_with(r#"echo "backup-file: $backUpFileName""#));
        let app = backup_uploads("demo").unwrap();
        assert!(app.contains(r#"backUpFileName="demo-UPLOADS-WP-$fileDt.tgz""#));
        assert!(app.contains("-C /var/www/html/wp-content/uploads ."));
    }

    #[test]
    fn test_init_scripts() {
        let init = init_site("my-theme", "my_theme_settings").unwrap();
        assert!(init.contains(r#"wp theme activate "my-theme""#));
        assert!(init.contains(r#"wp option update "my_theme_settings" --format=json < "/opt/scripts/theme_settings_default.json""#));
        let manager = init_manager().unwrap();
        assert!(manager.contains("--clone=editor"));
        assert!(manager.contains(
            "wp cap add site_manager create_users list_users edit_users delete_users promote_users activate_plugins manage_options edit_theme_options wpml_manage_wp_menus_sync"
        ));
        for script in [&init, &manager] {
            assert!(script.contains("command -v wp"));
            assert!(script.contains(r#"wp() { runuser -u www-data -- wp "$@"; }"#));
            assert!(!script.contains("sudo"));
        }
    }

    #[test]
    fn test_theme_settings_escapes_titles() {
        let s = theme_settings("Demo \"site\"", "Line", "department").unwrap();
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["titleLine1"], "Demo \"site\"");
        assert_eq!(v["entityType"], "department");
    }
}
