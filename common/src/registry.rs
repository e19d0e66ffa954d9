use crate::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use k8s_openapi::api::core::v1::Secret;
use serde_json::json;

/// Credentials of the private image registry, stored in every site namespace
#[derive(Clone, Debug, Default)]
pub struct RegistryCredentials {
    pub secret_name: String,
    pub server: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegistryCredentials {
    /// Content of the `.dockerconfigjson` key
    pub fn docker_config(&self) -> serde_json::Value {
        let mut auths = serde_json::Map::new();
        auths.insert(
            self.server.clone(),
            json!({
                "username": self.username,
                "password": self.password,
                "email": self.email,
                "auth": STANDARD.encode(format!("{}:{}", self.username, self.password)),
            }),
        );
        json!({ "auths": auths })
    }

    pub fn secret(&self, namespace: &str) -> Result<Secret> {
        let config = serde_json::to_string(&self.docker_config())?;
        Ok(serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {
                "name": self.secret_name,
                "namespace": namespace,
            },
            "type": "kubernetes.io/dockerconfigjson",
            "data": {
                ".dockerconfigjson": STANDARD.encode(config),
            }
        }))?)
    }
}
