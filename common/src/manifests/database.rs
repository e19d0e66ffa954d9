use super::{Manifest, SiteContext, scripts};
use crate::{
    Component, MANAGER, Result,
    backup::{DB_NAME, DUMP_MOUNT, SCRIPTS_MOUNT},
    component::MANAGED_BY_LABEL,
    layout::{DB_SCRIPTS, DB_SECRET},
};
use k8s_openapi::api::{
    apps::v1::Deployment,
    core::v1::{ConfigMap, Namespace, Service},
};
use serde_json::json;

pub const DATA_SIZE: &str = "1Gi";
pub const DUMP_SIZE: &str = "5Gi";
pub const PORT: i32 = 3306;

fn secret_env(name: &str, key: &str) -> serde_json::Value {
    json!({
        "name": name,
        "valueFrom": { "secretKeyRef": { "name": DB_SECRET, "key": key } }
    })
}

fn container(ctx: &SiteContext) -> serde_json::Value {
    json!({
        "name": "mysql",
        "image": ctx.settings.db_image,
        "imagePullPolicy": "Always",
        "ports": [{ "containerPort": PORT, "name": "mysql" }],
        "env": [
            { "name": "MYSQL_USER", "value": DB_NAME },
            { "name": "MYSQL_DATABASE", "value": DB_NAME },
            secret_env("MYSQL_PASSWORD", "password"),
            secret_env("MYSQL_ROOT_PASSWORD", "password"),
        ],
        "volumeMounts": [
            { "name": "data", "mountPath": "/var/lib/mysql" },
            { "name": "dump", "mountPath": DUMP_MOUNT },
            { "name": "scripts", "mountPath": SCRIPTS_MOUNT },
        ],
        "readinessProbe": {
            "exec": { "command": ["/bin/bash", format!("{SCRIPTS_MOUNT}/{}", scripts::CHECK_DB)] },
            "initialDelaySeconds": 60,
            "periodSeconds": 10,
            "failureThreshold": 3,
        },
    })
}

/// Namespace, storage, secret, scripts, deployment and headless service of the database
pub fn render(ctx: &SiteContext) -> Result<Manifest> {
    let component = Component::Database;
    let layout = ctx.layout;
    let mut manifest = Manifest::new();
    manifest.push_value::<Namespace>(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": ctx.site(),
            "labels": { MANAGED_BY_LABEL: MANAGER },
        }
    }))?;
    manifest.push(&ctx.volume(component, &layout.db_data_pv(), DATA_SIZE, &layout.db_data_dir())?)?;
    manifest.push(&ctx.volume(component, &layout.db_dump_pv(), DUMP_SIZE, &layout.db_dump_dir())?)?;
    manifest.push(&ctx.claim(component, layout.db_data_pvc(), &layout.db_data_pv(), DATA_SIZE)?)?;
    manifest.push(&ctx.claim(component, layout.db_dump_pvc(), &layout.db_dump_pv(), DUMP_SIZE)?)?;
    manifest.push(&ctx.password_secret(component, DB_SECRET, &ctx.config.database_password)?)?;
    let mut data = serde_json::Map::new();
    data.insert(scripts::CHECK_DB.to_string(), scripts::check_db().into());
    data.insert(scripts::BACKUP_DB.to_string(), scripts::backup_db(ctx.site())?.into());
    manifest.push_value::<ConfigMap>(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": DB_SCRIPTS,
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
            "revisionHistoryLimit": 0,
            "strategy": { "type": "Recreate" },
            "selector": { "matchLabels": ctx.selector(component) },
            "template": {
                "metadata": { "labels": ctx.pod_labels(component) },
                "spec": {
                    "imagePullSecrets": ctx.pull_secrets(),
                    "containers": [container(ctx)],
                    "volumes": [
                        { "name": "data", "persistentVolumeClaim": { "claimName": layout.db_data_pvc() } },
                        { "name": "dump", "persistentVolumeClaim": { "claimName": layout.db_dump_pvc() } },
                        { "name": "scripts", "configMap": { "name": DB_SCRIPTS } },
                    ],
                }
            }
        }
    }))?;
    manifest.push_value::<Service>(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": layout.db_service(),
            "namespace": ctx.site(),
            "labels": ctx.labels(component),
        },
        "spec": {
            "clusterIP": "None",
            "ports": [{ "port": PORT, "name": "mysql" }],
            "selector": ctx.selector(component),
        }
    }))?;
    Ok(manifest)
}
