//! Custom-data rendering.

use askama::Template;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::BootstrapResult;
use crate::variables::NodeBootstrapVariables;

#[derive(Template)]
#[template(path = "cse_cmd.sh", escape = "none")]
struct CustomDataTemplate<'a> {
    v: &'a NodeBootstrapVariables,
}

/// Expand the bootstrap script for a synthesized record.
pub fn render_script(vars: &NodeBootstrapVariables) -> BootstrapResult<String> {
    Ok(CustomDataTemplate { v: vars }.render()?)
}

/// Expand the bootstrap script and encode it as VM custom data.
///
/// Same record in, same bytes out.
pub fn render(vars: &NodeBootstrapVariables) -> BootstrapResult<String> {
    let script = render_script(vars)?;
    Ok(STANDARD.encode(script.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{ComputedInputs, Overrides, StaticBaseline};
    use crate::synth::synthesize;

    fn computed() -> ComputedInputs {
        ComputedInputs {
            tenant_id: "tenant-1".to_string(),
            subscription_id: "sub-1".to_string(),
            location: "westus".to_string(),
            resource_group: "MC_rg_cluster_westus".to_string(),
            cluster_id: "12345678".to_string(),
            api_server_name: "cluster-dns.hcp.westus.azmk8s.io".to_string(),
            tls_bootstrap_token: "abcdef.0123456789abcdef".to_string(),
            ca_bundle: "LS0tLS1CRUdJTi".to_string(),
            kubernetes_version: "1.26.3".to_string(),
            kube_binary_url: "https://example.invalid/kube.tar.gz".to_string(),
            network_plugin: "kubenet".to_string(),
            ..Default::default()
        }
    }

    fn vars(overrides: &Overrides) -> NodeBootstrapVariables {
        synthesize(&StaticBaseline::default(), &computed(), overrides).unwrap()
    }

    #[test]
    fn rendering_is_deterministic() {
        let v = vars(&Overrides::default());
        assert_eq!(render(&v).unwrap(), render(&v).unwrap());
    }

    #[test]
    fn custom_data_decodes_to_script() {
        let v = vars(&Overrides::default());
        let encoded = render(&v).unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();

        assert_eq!(decoded, render_script(&v).unwrap());
        assert!(decoded.starts_with("#!/bin/bash"));
        assert!(decoded.contains("API_SERVER_NAME=cluster-dns.hcp.westus.azmk8s.io"));
        assert!(decoded.contains("TLS_BOOTSTRAP_TOKEN=\"abcdef.0123456789abcdef\""));
        assert!(decoded.contains("KUBE_BINARY_URL=https://example.invalid/kube.tar.gz"));
        assert!(decoded.contains("NETWORK_SECURITY_GROUP=aks-agentpool-12345678-nsg"));
        assert!(decoded.contains("ENSURE_NO_DUPE_PROMISCUOUS_BRIDGE=\"true\""));
        assert!(decoded.contains(&format!("KUBELET_FLAGS=\"{}\"", v.kubelet_flags())));
        assert!(decoded.contains(&format!(
            "KUBELET_NODE_LABELS=\"{}\"",
            v.kubelet_node_labels()
        )));
    }

    #[test]
    fn each_custom_ca_gets_an_indexed_variable() {
        let overrides = Overrides {
            custom_ca_certs: Some(vec!["Y2VydDA=".to_string(), "Y2VydDE=".to_string()]),
            ..Default::default()
        };
        let script = render_script(&vars(&overrides)).unwrap();

        assert!(script.contains("SHOULD_CONFIGURE_CUSTOM_CA_TRUST=\"true\""));
        assert!(script.contains("CUSTOM_CA_TRUST_COUNT=\"2\""));
        assert!(script.contains("CUSTOM_CA_CERT_0=\"Y2VydDA=\""));
        assert!(script.contains("CUSTOM_CA_CERT_1=\"Y2VydDE=\""));
        assert!(!script.contains("CUSTOM_CA_CERT_2"));
    }

    #[test]
    fn custom_cloud_block_only_when_enabled() {
        let script = render_script(&vars(&Overrides::default())).unwrap();
        assert!(!script.contains("REPO_DEPOT_ENDPOINT"));
    }

    #[test]
    fn every_variable_is_assigned_once() {
        let script = render_script(&vars(&Overrides::default())).unwrap();
        let mut seen = std::collections::BTreeSet::new();
        for line in script.lines() {
            let Some((name, _)) = line.split_once('=') else {
                continue;
            };
            let is_variable = !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
            if is_variable {
                assert!(seen.insert(name.to_string()), "{name} assigned twice");
            }
        }
        assert!(seen.contains("KUBE_BINARY_URL"));
    }
}
