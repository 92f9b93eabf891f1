//! vmgrid.toml configuration parser.
//!
//! ```toml
//! [cluster]
//! tenant_id = "..."
//! subscription_id = "..."
//! location = "westus"
//! resource_group = "MC_rg_cluster_westus"
//! cluster_id = "12345678"
//! api_server_name = "cluster-dns.hcp.westus.azmk8s.io"
//! kubernetes_version = "1.26.3"
//!
//! [node]
//! agent_pool_name = "gpu"
//! labels = { team = "ml" }
//!
//! [kube_binary]
//! latest = "1.28.3"
//! ```
//!
//! The bootstrap token and CA bundle are secrets and are not read from
//! this file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use vmgrid_bootstrap::{ComputedInputs, KubeBinaryTable, Overrides};

/// Per-cluster identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub tenant_id: String,
    pub subscription_id: String,
    #[serde(default)]
    pub user_assigned_identity_id: String,
    pub location: String,
    pub resource_group: String,
    pub cluster_id: String,
    pub api_server_name: String,
    pub kubernetes_version: String,
    #[serde(default = "default_network_plugin")]
    pub network_plugin: String,
    #[serde(default)]
    pub network_policy: String,
    #[serde(default)]
    pub gpu_node: bool,
}

fn default_network_plugin() -> String {
    "kubenet".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub node: Overrides,
    #[serde(default)]
    pub kube_binary: KubeBinaryTable,
}

impl ProvisionerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ProvisionerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Computed bootstrap inputs for this cluster plus the runtime secrets.
    pub fn computed_inputs(&self, tls_bootstrap_token: &str, ca_bundle: &str) -> ComputedInputs {
        let cluster = &self.cluster;
        ComputedInputs {
            tenant_id: cluster.tenant_id.clone(),
            subscription_id: cluster.subscription_id.clone(),
            user_assigned_identity_id: cluster.user_assigned_identity_id.clone(),
            location: cluster.location.clone(),
            resource_group: cluster.resource_group.clone(),
            cluster_id: cluster.cluster_id.clone(),
            api_server_name: cluster.api_server_name.clone(),
            tls_bootstrap_token: tls_bootstrap_token.to_string(),
            ca_bundle: ca_bundle.to_string(),
            kubernetes_version: cluster.kubernetes_version.clone(),
            kube_binary_url: self.kube_binary.url_for(&cluster.kubernetes_version),
            network_plugin: cluster.network_plugin.clone(),
            network_policy: cluster.network_policy.clone(),
            gpu_node: cluster.gpu_node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[cluster]
tenant_id = "tenant"
subscription_id = "sub"
location = "westus"
resource_group = "MC_rg"
cluster_id = "1234"
api_server_name = "api.example"
kubernetes_version = "1.25.4"
"#;

    #[test]
    fn parse_minimal() {
        let config: ProvisionerConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.cluster.network_plugin, "kubenet");
        assert_eq!(config.node, Overrides::default());
        assert_eq!(config.kube_binary, KubeBinaryTable::default());

        let computed = config.computed_inputs("tok", "ca");
        assert_eq!(computed.tls_bootstrap_token, "tok");
        assert!(computed.kube_binary_url.contains("v1.25.6-hotfix.20230509"));
    }

    #[test]
    fn parse_overrides_and_table() {
        let toml_str = format!(
            r#"{MINIMAL}
[node]
agent_pool_name = "gpu"
swap_file_size_mb = 512

[node.labels]
team = "ml"

[kube_binary]
latest = "1.28.3"
"#
        );
        let config: ProvisionerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.node.agent_pool_name.as_deref(), Some("gpu"));
        assert_eq!(config.node.swap_file_size_mb, Some(512));
        assert_eq!(config.node.labels["team"], "ml");
        // Pins survive a partial table; 1.25 is pinned.
        assert_eq!(config.kube_binary.latest, "1.28.3");
        assert_eq!(config.kube_binary.build_for("1.25.4"), "1.25.6-hotfix.20230509");
        assert_eq!(config.kube_binary.build_for("1.29.0"), "1.28.3");
    }
}
