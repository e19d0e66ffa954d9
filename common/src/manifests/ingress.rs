use super::{Manifest, SiteContext, application};
use crate::{Component, Result};
use k8s_openapi::api::networking::v1::Ingress;
use serde_json::json;

/// Route `/` of the site host to the application service
pub fn render(ctx: &SiteContext) -> Result<Manifest> {
    let layout = ctx.layout;
    let mut spec = json!({
        "rules": [{
            "host": layout.host(&ctx.settings.domain),
            "http": {
                "paths": [{
                    "path": "/",
                    "pathType": "Prefix",
                    "backend": {
                        "service": {
                            "name": layout.app_service(),
                            "port": { "number": application::PORT },
                        }
                    }
                }]
            }
        }]
    });
    if let Some(class) = &ctx.settings.ingress_class {
        spec["ingressClassName"] = json!(class);
    }
    let mut manifest = Manifest::new();
    manifest.push_value::<Ingress>(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": {
            "name": layout.ingress(),
            "namespace": ctx.site(),
            "labels": ctx.labels(Component::Application),
        },
        "spec": spec,
    }))?;
    Ok(manifest)
}
