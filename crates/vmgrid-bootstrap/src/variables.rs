//! The synthesized bootstrap record.

use serde::Serialize;

/// Every variable the custom-data template needs, fully resolved.
///
/// Only [`synthesize`](crate::synthesize) constructs this type, and its
/// fields are not writable outside the crate: once built the record is
/// only read, by the renderer and through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBootstrapVariables {
    pub(crate) is_aks_custom_cloud: bool,
    pub(crate) init_aks_custom_cloud_filepath: String,
    pub(crate) aks_custom_cloud_repo_depot_endpoint: String,
    pub(crate) admin_username: String,
    pub(crate) moby_version: String,
    pub(crate) tenant_id: String,
    pub(crate) kubernetes_version: String,
    pub(crate) hyperkube_url: String,
    pub(crate) kube_binary_url: String,
    pub(crate) custom_kube_binary_url: String,
    pub(crate) kubeproxy_url: String,
    pub(crate) api_server_public_key: String,
    pub(crate) subscription_id: String,
    pub(crate) resource_group: String,
    pub(crate) location: String,
    pub(crate) vm_type: String,
    pub(crate) subnet: String,
    pub(crate) network_security_group: String,
    pub(crate) virtual_network: String,
    pub(crate) virtual_network_resource_group: String,
    pub(crate) route_table: String,
    pub(crate) primary_availability_set: String,
    pub(crate) primary_scale_set: String,
    pub(crate) service_principal_client_id: String,
    pub(crate) network_plugin: String,
    pub(crate) network_policy: String,
    pub(crate) vnet_cni_linux_plugins_url: String,
    pub(crate) cni_plugins_url: String,
    pub(crate) cloud_provider_backoff: bool,
    pub(crate) cloud_provider_backoff_mode: String,
    pub(crate) cloud_provider_backoff_retries: String,
    pub(crate) cloud_provider_backoff_exponent: String,
    pub(crate) cloud_provider_backoff_duration: String,
    pub(crate) cloud_provider_backoff_jitter: String,
    pub(crate) cloud_provider_ratelimit: bool,
    pub(crate) cloud_provider_ratelimit_qps: String,
    pub(crate) cloud_provider_ratelimit_qps_write: String,
    pub(crate) cloud_provider_ratelimit_bucket: String,
    pub(crate) cloud_provider_ratelimit_bucket_write: String,
    pub(crate) load_balancer_disable_outbound_snat: bool,
    pub(crate) use_managed_identity_extension: bool,
    pub(crate) use_instance_metadata: bool,
    pub(crate) load_balancer_sku: String,
    pub(crate) exclude_master_from_standard_lb: bool,
    pub(crate) maximum_loadbalancer_rule_count: u32,
    pub(crate) container_runtime: String,
    pub(crate) cli_tool: String,
    pub(crate) containerd_download_url_base: String,
    pub(crate) network_mode: String,
    pub(crate) user_assigned_identity_id: String,
    pub(crate) api_server_name: String,
    pub(crate) is_vhd: bool,
    pub(crate) gpu_node: bool,
    pub(crate) sgx_node: bool,
    pub(crate) mig_node: bool,
    pub(crate) config_gpu_driver_if_needed: bool,
    pub(crate) enable_gpu_device_plugin_if_needed: bool,
    pub(crate) teleportd_plugin_download_url: String,
    pub(crate) containerd_version: String,
    pub(crate) containerd_package_url: String,
    pub(crate) runc_version: String,
    pub(crate) runc_package_url: String,
    pub(crate) enable_hosts_config_agent: bool,
    pub(crate) disable_ssh: bool,
    pub(crate) needs_containerd: bool,
    pub(crate) teleport_enabled: bool,
    pub(crate) should_configure_http_proxy: bool,
    pub(crate) should_configure_http_proxy_ca: bool,
    pub(crate) http_proxy_trusted_ca: String,
    pub(crate) should_configure_custom_ca_trust: bool,
    pub(crate) custom_ca_trust_config_certs: Vec<String>,
    pub(crate) is_krustlet: bool,
    pub(crate) gpu_needs_fabric_manager: bool,
    pub(crate) needs_docker_login: bool,
    pub(crate) ipv6_dual_stack_enabled: bool,
    pub(crate) outbound_command: String,
    pub(crate) enable_unattended_upgrades: bool,
    pub(crate) ensure_no_dupe_promiscuous_bridge: bool,
    pub(crate) should_config_swap_file: bool,
    pub(crate) should_config_transparent_huge_page: bool,
    pub(crate) target_cloud: String,
    pub(crate) target_environment: String,
    pub(crate) custom_env_json: String,
    pub(crate) is_custom_cloud: bool,
    pub(crate) cse_helpers_filepath: String,
    pub(crate) cse_distro_helpers_filepath: String,
    pub(crate) cse_install_filepath: String,
    pub(crate) cse_distro_install_filepath: String,
    pub(crate) cse_config_filepath: String,
    pub(crate) azure_private_registry_server: String,
    pub(crate) has_custom_search_domain: bool,
    pub(crate) custom_search_domain_filepath: String,
    pub(crate) http_proxy_urls: String,
    pub(crate) https_proxy_urls: String,
    pub(crate) no_proxy_urls: String,
    pub(crate) client_tls_bootstrapping_enabled: bool,
    pub(crate) dhcpv6_service_filepath: String,
    pub(crate) dhcpv6_config_filepath: String,
    pub(crate) thp_enabled: String,
    pub(crate) thp_defrag: String,
    pub(crate) service_principal_file_content: String,
    pub(crate) kubelet_client_content: String,
    pub(crate) kubelet_client_cert_content: String,
    pub(crate) kubelet_config_file_enabled: bool,
    pub(crate) kubelet_config_file_content: String,
    pub(crate) swap_file_size_mb: u32,
    pub(crate) gpu_driver_version: String,
    pub(crate) gpu_instance_profile: String,
    pub(crate) custom_search_domain_name: String,
    pub(crate) custom_search_realm_user: String,
    pub(crate) custom_search_realm_password: String,
    pub(crate) message_of_the_day: String,
    pub(crate) has_kubelet_disk_type: bool,
    pub(crate) needs_cgroupsv2: bool,
    pub(crate) sysctl_content: String,
    pub(crate) tls_bootstrap_token: String,
    /// Space-separated `--flag=value` pairs, sorted by flag.
    pub(crate) kubelet_flags: String,
    /// Comma-separated `key=value` pairs, sorted by key.
    pub(crate) kubelet_node_labels: String,
    pub(crate) azure_environment_filepath: String,
    pub(crate) kube_ca_crt: String,
    pub(crate) kubenet_template: String,
    pub(crate) containerd_config_content: String,
    pub(crate) is_kata: bool,
}

impl NodeBootstrapVariables {
    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub fn api_server_name(&self) -> &str {
        &self.api_server_name
    }

    pub fn kubernetes_version(&self) -> &str {
        &self.kubernetes_version
    }

    pub fn kube_binary_url(&self) -> &str {
        &self.kube_binary_url
    }

    pub fn network_plugin(&self) -> &str {
        &self.network_plugin
    }

    pub fn network_policy(&self) -> &str {
        &self.network_policy
    }

    pub fn network_security_group(&self) -> &str {
        &self.network_security_group
    }

    pub fn virtual_network(&self) -> &str {
        &self.virtual_network
    }

    pub fn route_table(&self) -> &str {
        &self.route_table
    }

    pub fn ensure_no_dupe_promiscuous_bridge(&self) -> bool {
        self.ensure_no_dupe_promiscuous_bridge
    }

    pub fn kubelet_flags(&self) -> &str {
        &self.kubelet_flags
    }

    pub fn kubelet_node_labels(&self) -> &str {
        &self.kubelet_node_labels
    }

    pub fn should_configure_http_proxy(&self) -> bool {
        self.should_configure_http_proxy
    }

    pub fn should_configure_custom_ca_trust(&self) -> bool {
        self.should_configure_custom_ca_trust
    }

    pub fn custom_ca_trust_config_certs(&self) -> &[String] {
        &self.custom_ca_trust_config_certs
    }

    pub fn swap_file_size_mb(&self) -> u32 {
        self.swap_file_size_mb
    }

    pub fn disable_ssh(&self) -> bool {
        self.disable_ssh
    }
}
