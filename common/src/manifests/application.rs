use super::{Manifest, SiteContext, scripts};
use crate::{
    Component, Result,
    backup::{DB_NAME, DUMP_MOUNT, SCRIPTS_MOUNT, UPLOADS_MOUNT},
    layout::{ADMIN_SECRET, APP_SCRIPTS, DB_SECRET, USER_SECRET},
};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Service},
};
use serde_json::{Value, json};

pub const UPLOADS_SIZE: &str = "20Gi";
pub const DUMP_SIZE: &str = "5Gi";
pub const PORT: i32 = 80;

fn env(name: &str, value: &str) -> Value {
    json!({ "name": name, "value": value })
}

fn secret_env(name: &str, secret: &str) -> Value {
    json!({
        "name": name,
        "valueFrom": { "secretKeyRef": { "name": secret, "key": "password" } }
    })
}

fn container(ctx: &SiteContext) -> Value {
    let settings = ctx.settings;
    json!({
        "name": "wordpress",
        "image": settings.app_image,
        "imagePullPolicy": "Always",
        "ports": [{ "containerPort": PORT, "name": "wordpress" }],
        "env": [
            env("WORDPRESS_SITE_URL", &ctx.layout.host(&settings.domain)),
            env("WORDPRESS_SITE_NAME", &ctx.config.title_line1),
            env("WORDPRESS_ADMIN_USER", &settings.admin_user),
            secret_env("WORDPRESS_ADMIN_PASSWORD", ADMIN_SECRET),
            env("WORDPRESS_ADMIN_MAIL", &settings.admin_email),
            env("WORDPRESS_USER", &settings.manager_user),
            secret_env("WORDPRESS_PASSWORD", USER_SECRET),
            env("WORDPRESS_USER_MAIL", &ctx.config.user_email),
            env("WORDPRESS_DB_HOST", &ctx.layout.db_service()),
            env("WORDPRESS_DB_USER", DB_NAME),
            env("WORDPRESS_DB_NAME", DB_NAME),
            secret_env("WORDPRESS_DB_PASSWORD", DB_SECRET),
        ],
        "volumeMounts": [
            { "name": "uploads", "mountPath": UPLOADS_MOUNT },
            { "name": "scripts", "mountPath": SCRIPTS_MOUNT },
            { "name": "dump", "mountPath": DUMP_MOUNT },
        ],
    })
}

fn scripts_data(ctx: &SiteContext) -> Result<serde_json::Map<String, Value>> {
    let settings = ctx.settings;
    let config = ctx.config;
    let mut data = serde_json::Map::new();
    data.insert(
        scripts::INIT_SITE.to_string(),
        scripts::init_site(&settings.theme, &settings.theme_option)?.into(),
    );
    data.insert(scripts::INIT_MANAGER.to_string(), scripts::init_manager()?.into());
    data.insert(
        scripts::THEME_SETTINGS.to_string(),
        scripts::theme_settings(&config.title_line1, &config.title_line2, &config.entity_type)?.into(),
    );
    data.insert(scripts::BACKUP_UPLOADS.to_string(), scripts::backup_uploads(ctx.site())?.into());
    Ok(data)
}

/// Service, password secrets, storage, scripts and deployment of the application
pub fn render(ctx: &SiteContext) -> Result<Manifest> {
    let component = Component::Application;
    let layout = ctx.layout;
    let mut manifest = Manifest::new();
    manifest.push_value::<Service>(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": layout.app_service(),
            "namespace": ctx.site(),
            "labels": ctx.labels(component),
        },
        "spec": {
            "type": "ClusterIP",
            "ports": [{ "port": PORT, "name": "http" }],
            "selector": ctx.selector(component),
        }
    }))?;
    manifest.push(&ctx.password_secret(component, ADMIN_SECRET, &ctx.config.admin_password)?)?;
    manifest.push(&ctx.password_secret(component, USER_SECRET, &ctx.config.user_password)?)?;
    manifest.push(&ctx.volume(component, &layout.app_data_pv(), UPLOADS_SIZE, &layout.app_uploads_dir())?)?;
    manifest.push(&ctx.volume(component, &layout.app_dump_pv(), DUMP_SIZE, &layout.app_dump_dir())?)?;
    manifest.push(&ctx.claim(component, layout.app_data_pvc(), &layout.app_data_pv(), UPLOADS_SIZE)?)?;
    manifest.push(&ctx.claim(component, layout.app_dump_pvc(), &layout.app_dump_pv(), DUMP_SIZE)?)?;
    let data = scripts_data(ctx)?;
    manifest.push_value::<ConfigMap>(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": APP_SCRIPTS,
            "namespace": ctx.site(),
            "labels": ctx.labels(component),
        },
        "data": data,
    }))?;
    manifest.push_value::<Deployment>(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": layout.deployment(component),
            "namespace": ctx.site(),
            "labels": ctx.labels(component),
        },
        "spec": {
            "replicas": 1,
            "strategy": { "type": "Recreate" },
            "selector": { "matchLabels": ctx.selector(component) },
            "template": {
                "metadata": { "labels": ctx.pod_labels(component) },
                "spec": {
                    "imagePullSecrets": ctx.pull_secrets(),
                    "containers": [container(ctx)],
                    "volumes": [
                        { "name": "uploads", "persistentVolumeClaim": { "claimName": layout.app_data_pvc() } },
                        { "name": "scripts", "configMap": { "name": APP_SCRIPTS } },
                        { "name": "dump", "persistentVolumeClaim": { "claimName": layout.app_dump_pvc() } },
                    ],
                }
            }
        }
    }))?;
    Ok(manifest)
}
