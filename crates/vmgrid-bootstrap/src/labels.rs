//! Node label generation and label/flag serialization.

use std::collections::BTreeMap;

/// Maximum length of a Kubernetes label value.
const MAX_LABEL_VALUE_LEN: usize = 63;

pub const LABEL_ROLE: &str = "kubernetes.azure.com/role";
pub const LABEL_AGENT_POOL: &str = "agentpool";
pub const LABEL_AZURE_AGENT_POOL: &str = "kubernetes.azure.com/agentpool";
pub const LABEL_CLUSTER: &str = "kubernetes.azure.com/cluster";

/// Normalize a resource group name into a valid label value.
///
/// `(` and `)` become `-`, the result is cut to 63 bytes, and a trailing
/// `-`, `_` or `.` is fixed up with a `z`: replacing the last character
/// when already at the cap, appended otherwise. Downstream labeling
/// depends on this exact output.
pub fn normalize_resource_group_name_for_label(resource_group_name: &str) -> String {
    let mut truncated = resource_group_name.replace(['(', ')'], "-");
    if truncated.len() > MAX_LABEL_VALUE_LEN {
        let mut end = MAX_LABEL_VALUE_LEN;
        while !truncated.is_char_boundary(end) {
            end -= 1;
        }
        truncated.truncate(end);
    }

    if truncated.ends_with(['-', '_', '.']) {
        if truncated.len() > MAX_LABEL_VALUE_LEN - 1 {
            truncated.pop();
        }
        truncated.push('z');
    }
    truncated
}

/// Labels every node gets: role, pool name and the cluster label.
pub(crate) fn generated_labels(resource_group: &str, agent_pool_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_ROLE.to_string(), "agent".to_string()),
        (LABEL_AGENT_POOL.to_string(), agent_pool_name.to_string()),
        (LABEL_AZURE_AGENT_POOL.to_string(), agent_pool_name.to_string()),
        (
            LABEL_CLUSTER.to_string(),
            normalize_resource_group_name_for_label(resource_group),
        ),
    ])
}

/// Layer maps left to right; later maps win on key collisions.
pub(crate) fn merge_maps<'a>(
    layers: impl IntoIterator<Item = &'a BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// `k=v` pairs in key order, joined by `sep`.
pub(crate) fn join_pairs(map: &BTreeMap<String, String>, sep: &str) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_replaces_parentheses() {
        assert_eq!(
            normalize_resource_group_name_for_label("MC_rg(prod)_cluster_westus"),
            "MC_rg-prod-_cluster_westus"
        );
    }

    #[test]
    fn normalize_appends_z_to_bad_suffix() {
        assert_eq!(normalize_resource_group_name_for_label("rg-"), "rg-z");
        assert_eq!(normalize_resource_group_name_for_label("rg_"), "rg_z");
        assert_eq!(normalize_resource_group_name_for_label("rg."), "rg.z");
        assert_eq!(normalize_resource_group_name_for_label("rg(x)"), "rg-x-z");
        assert_eq!(normalize_resource_group_name_for_label("plain"), "plain");
    }

    #[test]
    fn normalize_truncates_and_replaces_at_cap() {
        let long = format!("{}-tail", "a".repeat(62));
        let out = normalize_resource_group_name_for_label(&long);
        assert_eq!(out.len(), 63);
        assert_eq!(out, format!("{}z", "a".repeat(62)));

        let exactly = "b".repeat(70);
        assert_eq!(normalize_resource_group_name_for_label(&exactly), "b".repeat(63));
    }

    #[test]
    fn normalize_appends_below_cap() {
        let name = format!("{}_", "c".repeat(61));
        let out = normalize_resource_group_name_for_label(&name);
        assert_eq!(out, format!("{}_z", "c".repeat(61)));
        assert_eq!(out.len(), 63);
    }

    #[test]
    fn normalize_output_is_always_a_valid_label_value() {
        let alphabet = ['a', '-', '_', '.', '(', ')', 'Z', '9', 'é'];
        for len in 0..80 {
            for offset in 0..alphabet.len() {
                let input: String = (0..len)
                    .map(|i| alphabet[(i * 7 + offset) % alphabet.len()])
                    .collect();
                let out = normalize_resource_group_name_for_label(&input);
                assert!(out.len() <= 63, "{input:?} -> {out:?}");
                assert!(!out.ends_with(['-', '_', '.']), "{input:?} -> {out:?}");
                assert!(!out.contains(['(', ')']), "{input:?} -> {out:?}");
            }
        }
    }

    #[test]
    fn generated_labels_use_pool_and_cluster() {
        let labels = generated_labels("MC_rg_cluster(1)", "nodepool1");
        assert_eq!(labels[LABEL_ROLE], "agent");
        assert_eq!(labels[LABEL_AGENT_POOL], "nodepool1");
        assert_eq!(labels[LABEL_AZURE_AGENT_POOL], "nodepool1");
        assert_eq!(labels[LABEL_CLUSTER], "MC_rg_cluster-1-z");
    }

    #[test]
    fn later_layers_win() {
        let base = BTreeMap::from([("a".to_string(), "1".to_string()), ("b".to_string(), "1".to_string())]);
        let top = BTreeMap::from([("b".to_string(), "2".to_string())]);
        let merged = merge_maps([&base, &top]);
        assert_eq!(join_pairs(&merged, ","), "a=1,b=2");
        assert_eq!(join_pairs(&merged, " "), "a=1 b=2");
    }
}
