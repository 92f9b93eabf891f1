//! Kubernetes version → node binary URL lookup.
//!
//! Known minor versions map to a pinned patch build; anything else,
//! including versions that fail to parse, gets the `latest` build.
//! Resolution never errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_URL_TEMPLATE: &str =
    "https://acs-mirror.azureedge.net/kubernetes/v{version}/binaries/kubernetes-node-linux-amd64.tar.gz";

/// Pinned node binary builds, keyed by Kubernetes minor version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeBinaryTable {
    /// URL with a `{version}` placeholder.
    pub url_template: String,
    /// Build used for any minor version not pinned.
    pub latest: String,
    /// Minor version (as a string key, e.g. `"26"`) → build version.
    pub pinned: BTreeMap<String, String>,
}

impl Default for KubeBinaryTable {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            latest: "1.27.1".to_string(),
            pinned: BTreeMap::from([
                ("24".to_string(), "1.24.10-hotfix.20230509".to_string()),
                ("25".to_string(), "1.25.6-hotfix.20230509".to_string()),
                ("26".to_string(), "1.26.3-hotfix.20230509".to_string()),
            ]),
        }
    }
}

impl KubeBinaryTable {
    /// Build version to download for a Kubernetes version.
    pub fn build_for(&self, kubernetes_version: &str) -> &str {
        parse_minor(kubernetes_version)
            .and_then(|minor| self.pinned.get(&minor.to_string()))
            .map(String::as_str)
            .unwrap_or(self.latest.as_str())
    }

    /// Download URL of the node binaries for a Kubernetes version.
    pub fn url_for(&self, kubernetes_version: &str) -> String {
        let build = self.build_for(kubernetes_version);
        debug!(%kubernetes_version, %build, "resolved kube binary build");
        self.url_template.replace("{version}", build)
    }
}

/// Minor version of `1.26.3`, `v1.26.3` or `1.26`.
fn parse_minor(version: &str) -> Option<u64> {
    let trimmed = version.trim().trim_start_matches('v');
    if let Ok(v) = semver::Version::parse(trimmed) {
        return Some(v.minor);
    }
    let mut parts = trimmed.split('.');
    parts.next()?.parse::<u64>().ok()?;
    parts.next()?.parse::<u64>().ok()
}
