//! Bootstrap variable synthesis.
//!
//! A pure merge of the three input layers. Inputs are borrowed and never
//! modified; the base label and flag maps are copied before layering.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{BootstrapError, BootstrapResult};
use crate::inputs::{ComputedInputs, Overrides, StaticBaseline};
use crate::labels::{generated_labels, join_pairs, merge_maps};
use crate::variables::NodeBootstrapVariables;

const REGISTER_WITH_TAINTS_FLAG: &str = "--register-with-taints";

/// Whether the node must keep the kubenet bridge out of promiscuous mode.
///
/// Only kubenet without calico on a containerd node needs it.
pub fn ensure_no_dupe_promiscuous_bridge(
    needs_containerd: bool,
    network_plugin: &str,
    network_policy: &str,
) -> bool {
    needs_containerd && network_plugin == "kubenet" && network_policy != "calico"
}

fn require(field: &'static str, value: &str) -> BootstrapResult<()> {
    if value.is_empty() {
        return Err(BootstrapError::MissingRequiredInput { field });
    }
    Ok(())
}

fn check_required(computed: &ComputedInputs) -> BootstrapResult<()> {
    require("ca_bundle", &computed.ca_bundle)?;
    require("api_server_name", &computed.api_server_name)?;
    require("tls_bootstrap_token", &computed.tls_bootstrap_token)?;
    require("tenant_id", &computed.tenant_id)?;
    require("subscription_id", &computed.subscription_id)?;
    require("location", &computed.location)?;
    require("resource_group", &computed.resource_group)?;
    require("cluster_id", &computed.cluster_id)?;
    Ok(())
}

/// Merge baseline, computed values and overrides into one record.
///
/// Precedence is override > computed > static. Labels are layered as
/// base, then generated (role, pool, cluster), then caller labels. Flags
/// are layered as base, then `--register-with-taints` when taints are
/// declared, then caller flags.
pub fn synthesize(
    baseline: &StaticBaseline,
    computed: &ComputedInputs,
    overrides: &Overrides,
) -> BootstrapResult<NodeBootstrapVariables> {
    check_required(computed)?;

    let agent_pool_name = overrides
        .agent_pool_name
        .as_deref()
        .unwrap_or(&baseline.agent_pool_name);

    let network_plugin = overrides
        .network_plugin
        .clone()
        .unwrap_or_else(|| computed.network_plugin.clone());
    let network_policy = overrides
        .network_policy
        .clone()
        .unwrap_or_else(|| computed.network_policy.clone());

    // Labels.
    let generated = generated_labels(&computed.resource_group, agent_pool_name);
    let labels = merge_maps([&baseline.node_labels, &generated, &overrides.labels]);

    // Kubelet flags, including taints.
    let mut taint_flags = BTreeMap::new();
    if !overrides.taints.is_empty() {
        let taints: Vec<String> = overrides.taints.iter().map(ToString::to_string).collect();
        taint_flags.insert(REGISTER_WITH_TAINTS_FLAG.to_string(), taints.join(","));
    }
    let flags = merge_maps([&baseline.kubelet_flags, &taint_flags, &overrides.kubelet_flags]);

    // Proxy.
    let proxy = overrides.proxy.as_ref();
    let proxy_ca = proxy
        .and_then(|p| p.trusted_ca.clone())
        .filter(|ca| !ca.is_empty());

    // Custom CA trust.
    let custom_ca_certs = overrides.custom_ca_certs.clone().unwrap_or_default();

    let swap_file_size_mb = overrides.swap_file_size_mb.unwrap_or(0);
    let thp = overrides.transparent_huge_page.clone().unwrap_or_default();

    let b = baseline;
    let vars = NodeBootstrapVariables {
        is_aks_custom_cloud: b.is_aks_custom_cloud,
        init_aks_custom_cloud_filepath: b.init_aks_custom_cloud_filepath.clone(),
        aks_custom_cloud_repo_depot_endpoint: b.aks_custom_cloud_repo_depot_endpoint.clone(),
        admin_username: overrides
            .admin_username
            .clone()
            .unwrap_or_else(|| b.admin_username.clone()),
        moby_version: b.moby_version.clone(),
        tenant_id: computed.tenant_id.clone(),
        kubernetes_version: computed.kubernetes_version.clone(),
        hyperkube_url: b.hyperkube_url.clone(),
        kube_binary_url: computed.kube_binary_url.clone(),
        custom_kube_binary_url: b.custom_kube_binary_url.clone(),
        kubeproxy_url: b.kubeproxy_url.clone(),
        api_server_public_key: b.api_server_public_key.clone(),
        subscription_id: computed.subscription_id.clone(),
        resource_group: computed.resource_group.clone(),
        location: computed.location.clone(),
        vm_type: b.vm_type.clone(),
        subnet: b.subnet.clone(),
        network_security_group: format!("aks-agentpool-{}-nsg", computed.cluster_id),
        virtual_network: format!("aks-vnet-{}", computed.cluster_id),
        virtual_network_resource_group: b.virtual_network_resource_group.clone(),
        route_table: format!("aks-agentpool-{}-routetable", computed.cluster_id),
        primary_availability_set: b.primary_availability_set.clone(),
        primary_scale_set: b.primary_scale_set.clone(),
        service_principal_client_id: b.service_principal_client_id.clone(),
        ensure_no_dupe_promiscuous_bridge: ensure_no_dupe_promiscuous_bridge(
            b.needs_containerd,
            &network_plugin,
            &network_policy,
        ),
        network_plugin,
        network_policy,
        vnet_cni_linux_plugins_url: b.vnet_cni_linux_plugins_url.clone(),
        cni_plugins_url: b.cni_plugins_url.clone(),
        cloud_provider_backoff: b.cloud_provider_backoff,
        cloud_provider_backoff_mode: b.cloud_provider_backoff_mode.clone(),
        cloud_provider_backoff_retries: b.cloud_provider_backoff_retries.clone(),
        cloud_provider_backoff_exponent: b.cloud_provider_backoff_exponent.clone(),
        cloud_provider_backoff_duration: b.cloud_provider_backoff_duration.clone(),
        cloud_provider_backoff_jitter: b.cloud_provider_backoff_jitter.clone(),
        cloud_provider_ratelimit: b.cloud_provider_ratelimit,
        cloud_provider_ratelimit_qps: b.cloud_provider_ratelimit_qps.clone(),
        cloud_provider_ratelimit_qps_write: b.cloud_provider_ratelimit_qps_write.clone(),
        cloud_provider_ratelimit_bucket: b.cloud_provider_ratelimit_bucket.clone(),
        cloud_provider_ratelimit_bucket_write: b.cloud_provider_ratelimit_bucket_write.clone(),
        load_balancer_disable_outbound_snat: b.load_balancer_disable_outbound_snat,
        use_managed_identity_extension: b.use_managed_identity_extension,
        use_instance_metadata: b.use_instance_metadata,
        load_balancer_sku: b.load_balancer_sku.clone(),
        exclude_master_from_standard_lb: b.exclude_master_from_standard_lb,
        maximum_loadbalancer_rule_count: b.maximum_loadbalancer_rule_count,
        container_runtime: b.container_runtime.clone(),
        cli_tool: b.cli_tool.clone(),
        containerd_download_url_base: b.containerd_download_url_base.clone(),
        network_mode: b.network_mode.clone(),
        user_assigned_identity_id: computed.user_assigned_identity_id.clone(),
        api_server_name: computed.api_server_name.clone(),
        is_vhd: b.is_vhd,
        gpu_node: computed.gpu_node,
        sgx_node: b.sgx_node,
        mig_node: b.mig_node,
        config_gpu_driver_if_needed: b.config_gpu_driver_if_needed,
        enable_gpu_device_plugin_if_needed: b.enable_gpu_device_plugin_if_needed,
        teleportd_plugin_download_url: b.teleportd_plugin_download_url.clone(),
        containerd_version: b.containerd_version.clone(),
        containerd_package_url: b.containerd_package_url.clone(),
        runc_version: b.runc_version.clone(),
        runc_package_url: b.runc_package_url.clone(),
        enable_hosts_config_agent: b.enable_hosts_config_agent,
        disable_ssh: overrides.disable_ssh.unwrap_or(b.disable_ssh),
        needs_containerd: b.needs_containerd,
        teleport_enabled: b.teleport_enabled,
        should_configure_http_proxy: proxy.is_some(),
        should_configure_http_proxy_ca: proxy_ca.is_some(),
        http_proxy_trusted_ca: proxy_ca.unwrap_or_default(),
        should_configure_custom_ca_trust: !custom_ca_certs.is_empty(),
        custom_ca_trust_config_certs: custom_ca_certs,
        is_krustlet: b.is_krustlet,
        gpu_needs_fabric_manager: b.gpu_needs_fabric_manager,
        needs_docker_login: b.needs_docker_login,
        ipv6_dual_stack_enabled: b.ipv6_dual_stack_enabled,
        outbound_command: b.outbound_command.clone(),
        enable_unattended_upgrades: b.enable_unattended_upgrades,
        should_config_swap_file: swap_file_size_mb > 0,
        should_config_transparent_huge_page: overrides.transparent_huge_page.is_some(),
        target_cloud: b.target_cloud.clone(),
        target_environment: b.target_environment.clone(),
        custom_env_json: b.custom_env_json.clone(),
        is_custom_cloud: b.is_custom_cloud,
        cse_helpers_filepath: b.cse_helpers_filepath.clone(),
        cse_distro_helpers_filepath: b.cse_distro_helpers_filepath.clone(),
        cse_install_filepath: b.cse_install_filepath.clone(),
        cse_distro_install_filepath: b.cse_distro_install_filepath.clone(),
        cse_config_filepath: b.cse_config_filepath.clone(),
        azure_private_registry_server: b.azure_private_registry_server.clone(),
        has_custom_search_domain: b.has_custom_search_domain,
        custom_search_domain_filepath: b.custom_search_domain_filepath.clone(),
        http_proxy_urls: proxy.map(|p| p.http_proxy.clone()).unwrap_or_default(),
        https_proxy_urls: proxy.map(|p| p.https_proxy.clone()).unwrap_or_default(),
        no_proxy_urls: proxy.map(|p| p.no_proxy.join(",")).unwrap_or_default(),
        client_tls_bootstrapping_enabled: b.client_tls_bootstrapping_enabled,
        dhcpv6_service_filepath: b.dhcpv6_service_filepath.clone(),
        dhcpv6_config_filepath: b.dhcpv6_config_filepath.clone(),
        thp_enabled: thp.enabled,
        thp_defrag: thp.defrag,
        service_principal_file_content: b.service_principal_file_content.clone(),
        kubelet_client_content: b.kubelet_client_content.clone(),
        kubelet_client_cert_content: b.kubelet_client_cert_content.clone(),
        kubelet_config_file_enabled: b.kubelet_config_file_enabled,
        kubelet_config_file_content: b.kubelet_config_file_content.clone(),
        swap_file_size_mb,
        gpu_driver_version: b.gpu_driver_version.clone(),
        gpu_instance_profile: overrides
            .gpu_instance_profile
            .clone()
            .unwrap_or_else(|| b.gpu_instance_profile.clone()),
        custom_search_domain_name: b.custom_search_domain_name.clone(),
        custom_search_realm_user: b.custom_search_realm_user.clone(),
        custom_search_realm_password: b.custom_search_realm_password.clone(),
        message_of_the_day: overrides
            .message_of_the_day
            .clone()
            .unwrap_or_else(|| b.message_of_the_day.clone()),
        has_kubelet_disk_type: b.has_kubelet_disk_type,
        needs_cgroupsv2: b.needs_cgroupsv2,
        sysctl_content: b.sysctl_content.clone(),
        tls_bootstrap_token: computed.tls_bootstrap_token.clone(),
        kubelet_flags: join_pairs(&flags, " "),
        kubelet_node_labels: join_pairs(&labels, ","),
        azure_environment_filepath: b.azure_environment_filepath.clone(),
        kube_ca_crt: computed.ca_bundle.clone(),
        kubenet_template: b.kubenet_template.clone(),
        containerd_config_content: b.containerd_config_content.clone(),
        is_kata: b.is_kata,
    };

    debug!(
        api_server = %vars.api_server_name,
        kubernetes_version = %vars.kubernetes_version,
        labels = labels.len(),
        flags = flags.len(),
        "bootstrap variables synthesized"
    );
    Ok(vars)
}
