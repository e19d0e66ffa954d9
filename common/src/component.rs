use crate::gateway::PodInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";
pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const VERSION_LABEL: &str = "app.kubernetes.io/version";
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Workload of a site
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Database,
    Application,
}

impl Component {
    /// Value of the `app.kubernetes.io/component` label
    pub fn label(&self) -> &'static str {
        match self {
            Component::Database => "database",
            Component::Application => "application",
        }
    }

    /// Name marker of the deployment, and of its pods
    pub fn marker(&self) -> &'static str {
        match self {
            Component::Database => "bd",
            Component::Application => "wordpress",
        }
    }

    /// Legacy `tier` label used by the services selectors
    pub fn tier(&self) -> &'static str {
        match self {
            Component::Database => "mysql",
            Component::Application => "frontend",
        }
    }

    /// Is this pod a replica of the component for the site.
    ///
    /// Labelled pods are matched on the component label only. Pods created
    /// without it fall back on the `{site}-{marker}-` name prefix.
    pub fn matches(&self, site: &str, pod: &PodInfo) -> bool {
        match pod.labels.get(COMPONENT_LABEL) {
            Some(value) => value == self.label(),
            None => pod.name.starts_with(&format!("{site}-{}-", self.marker())),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
