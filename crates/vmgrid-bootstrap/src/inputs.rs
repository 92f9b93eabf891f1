//! Synthesis inputs, one struct per provenance class.
//!
//! - [`StaticBaseline`]: constants shipped with vmgrid for the supported
//!   platform version. Never mutated in place; synthesis works on a copy.
//! - [`ComputedInputs`]: per-cluster and per-node identity resolved at
//!   runtime. The identity fields have no default.
//! - [`Overrides`]: user intent per node pool or per node. `None` (or an
//!   empty collection) means "not overridden".

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

const SYSCTL_CONF: &str = include_str!("../assets/sysctl.conf");
const KUBENET_CNI_TEMPLATE: &str = include_str!("../assets/kubenet-cni.json");
const CONTAINERD_TOML: &str = include_str!("../assets/containerd.toml");

/// Agent pool name used for node labeling.
pub const DEFAULT_AGENT_POOL_NAME: &str = "nodepool1";

// ── Static baseline ───────────────────────────────────────────────

/// Static defaults: kubelet flags, node labels, cloud-provider rate limits,
/// filesystem paths and feature toggles fixed for the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticBaseline {
    pub is_aks_custom_cloud: bool,
    pub init_aks_custom_cloud_filepath: String,
    pub aks_custom_cloud_repo_depot_endpoint: String,
    pub admin_username: String,
    pub moby_version: String,
    pub hyperkube_url: String,
    pub custom_kube_binary_url: String,
    pub kubeproxy_url: String,
    pub api_server_public_key: String,
    pub vm_type: String,
    pub subnet: String,
    pub virtual_network_resource_group: String,
    pub primary_availability_set: String,
    pub primary_scale_set: String,
    pub service_principal_client_id: String,
    pub vnet_cni_linux_plugins_url: String,
    pub cni_plugins_url: String,

    // Cloud provider config.
    pub cloud_provider_backoff: bool,
    pub cloud_provider_backoff_mode: String,
    pub cloud_provider_backoff_retries: String,
    pub cloud_provider_backoff_exponent: String,
    pub cloud_provider_backoff_duration: String,
    pub cloud_provider_backoff_jitter: String,
    pub cloud_provider_ratelimit: bool,
    pub cloud_provider_ratelimit_qps: String,
    pub cloud_provider_ratelimit_qps_write: String,
    pub cloud_provider_ratelimit_bucket: String,
    pub cloud_provider_ratelimit_bucket_write: String,
    pub load_balancer_disable_outbound_snat: bool,
    pub use_managed_identity_extension: bool,
    pub use_instance_metadata: bool,
    pub load_balancer_sku: String,
    pub exclude_master_from_standard_lb: bool,
    pub maximum_loadbalancer_rule_count: u32,

    pub container_runtime: String,
    pub cli_tool: String,
    pub containerd_download_url_base: String,
    pub network_mode: String,
    pub is_vhd: bool,
    pub sgx_node: bool,
    pub mig_node: bool,
    pub config_gpu_driver_if_needed: bool,
    pub enable_gpu_device_plugin_if_needed: bool,
    pub teleportd_plugin_download_url: String,
    pub containerd_version: String,
    pub containerd_package_url: String,
    pub runc_version: String,
    pub runc_package_url: String,
    pub enable_hosts_config_agent: bool,
    pub disable_ssh: bool,
    pub needs_containerd: bool,
    pub teleport_enabled: bool,
    pub is_krustlet: bool,
    pub gpu_needs_fabric_manager: bool,
    pub needs_docker_login: bool,
    pub ipv6_dual_stack_enabled: bool,
    pub outbound_command: String,
    pub enable_unattended_upgrades: bool,
    pub target_cloud: String,
    pub target_environment: String,
    pub custom_env_json: String,
    pub is_custom_cloud: bool,

    // Provisioning script locations on the image.
    pub cse_helpers_filepath: String,
    pub cse_distro_helpers_filepath: String,
    pub cse_install_filepath: String,
    pub cse_distro_install_filepath: String,
    pub cse_config_filepath: String,

    pub azure_private_registry_server: String,
    pub has_custom_search_domain: bool,
    pub custom_search_domain_filepath: String,
    pub custom_search_domain_name: String,
    pub custom_search_realm_user: String,
    pub custom_search_realm_password: String,
    pub client_tls_bootstrapping_enabled: bool,
    pub dhcpv6_service_filepath: String,
    pub dhcpv6_config_filepath: String,
    pub service_principal_file_content: String,
    pub kubelet_client_content: String,
    pub kubelet_client_cert_content: String,
    pub kubelet_config_file_enabled: bool,
    pub kubelet_config_file_content: String,
    pub gpu_driver_version: String,
    pub gpu_instance_profile: String,
    pub message_of_the_day: String,
    pub has_kubelet_disk_type: bool,
    pub needs_cgroupsv2: bool,
    pub azure_environment_filepath: String,
    pub is_kata: bool,

    // Base64-encoded file payloads.
    pub sysctl_content: String,
    pub kubenet_template: String,
    pub containerd_config_content: String,

    /// Base kubelet flags.
    pub kubelet_flags: BTreeMap<String, String>,
    /// Base node labels.
    pub node_labels: BTreeMap<String, String>,
    /// Agent pool name for generated labels.
    pub agent_pool_name: String,
}

impl Default for StaticBaseline {
    fn default() -> Self {
        Self {
            is_aks_custom_cloud: false,
            init_aks_custom_cloud_filepath: String::new(),
            aks_custom_cloud_repo_depot_endpoint: String::new(),
            admin_username: "azureuser".to_string(),
            moby_version: String::new(),
            hyperkube_url: String::new(),
            custom_kube_binary_url: String::new(),
            kubeproxy_url: String::new(),
            api_server_public_key: String::new(),
            vm_type: "vmss".to_string(),
            subnet: "aks-subnet".to_string(),
            virtual_network_resource_group: String::new(),
            primary_availability_set: String::new(),
            primary_scale_set: String::new(),
            service_principal_client_id: "msi".to_string(),
            vnet_cni_linux_plugins_url: "https://acs-mirror.azureedge.net/azure-cni/v1.4.32/binaries/azure-vnet-cni-linux-amd64-v1.4.32.tgz".to_string(),
            cni_plugins_url: "https://acs-mirror.azureedge.net/cni-plugins/v1.1.1/binaries/cni-plugins-linux-amd64-v1.1.1.tgz".to_string(),

            cloud_provider_backoff: true,
            cloud_provider_backoff_mode: "v2".to_string(),
            cloud_provider_backoff_retries: "6".to_string(),
            cloud_provider_backoff_exponent: "0".to_string(),
            cloud_provider_backoff_duration: "5".to_string(),
            cloud_provider_backoff_jitter: "0".to_string(),
            cloud_provider_ratelimit: true,
            cloud_provider_ratelimit_qps: "10".to_string(),
            cloud_provider_ratelimit_qps_write: "10".to_string(),
            cloud_provider_ratelimit_bucket: "100".to_string(),
            cloud_provider_ratelimit_bucket_write: "100".to_string(),
            load_balancer_disable_outbound_snat: false,
            use_managed_identity_extension: false,
            use_instance_metadata: true,
            load_balancer_sku: "Standard".to_string(),
            exclude_master_from_standard_lb: true,
            maximum_loadbalancer_rule_count: 250,

            container_runtime: "containerd".to_string(),
            cli_tool: "ctr".to_string(),
            containerd_download_url_base: String::new(),
            network_mode: String::new(),
            is_vhd: true,
            sgx_node: false,
            mig_node: false,
            config_gpu_driver_if_needed: true,
            enable_gpu_device_plugin_if_needed: false,
            teleportd_plugin_download_url: String::new(),
            containerd_version: String::new(),
            containerd_package_url: String::new(),
            runc_version: String::new(),
            runc_package_url: String::new(),
            enable_hosts_config_agent: false,
            disable_ssh: false,
            needs_containerd: true,
            teleport_enabled: false,
            is_krustlet: false,
            gpu_needs_fabric_manager: false,
            needs_docker_login: false,
            ipv6_dual_stack_enabled: false,
            outbound_command: "curl -v --insecure --proxy-insecure https://mcr.microsoft.com/v2/".to_string(),
            enable_unattended_upgrades: true,
            target_cloud: "AzurePublicCloud".to_string(),
            target_environment: "AzurePublicCloud".to_string(),
            custom_env_json: String::new(),
            is_custom_cloud: false,

            cse_helpers_filepath: "/opt/azure/containers/provision_source.sh".to_string(),
            cse_distro_helpers_filepath: "/opt/azure/containers/provision_source_distro.sh".to_string(),
            cse_install_filepath: "/opt/azure/containers/provision_installs.sh".to_string(),
            cse_distro_install_filepath: "/opt/azure/containers/provision_installs_distro.sh".to_string(),
            cse_config_filepath: "/opt/azure/containers/provision_configs.sh".to_string(),

            azure_private_registry_server: String::new(),
            has_custom_search_domain: false,
            custom_search_domain_filepath: "/opt/azure/containers/setup-custom-search-domains.sh".to_string(),
            custom_search_domain_name: String::new(),
            custom_search_realm_user: String::new(),
            custom_search_realm_password: String::new(),
            client_tls_bootstrapping_enabled: true,
            dhcpv6_service_filepath: String::new(),
            dhcpv6_config_filepath: String::new(),
            service_principal_file_content: STANDARD.encode("msi"),
            kubelet_client_content: String::new(),
            kubelet_client_cert_content: String::new(),
            kubelet_config_file_enabled: false,
            kubelet_config_file_content: String::new(),
            gpu_driver_version: String::new(),
            gpu_instance_profile: String::new(),
            message_of_the_day: String::new(),
            has_kubelet_disk_type: false,
            needs_cgroupsv2: false,
            azure_environment_filepath: String::new(),
            is_kata: false,

            sysctl_content: STANDARD.encode(SYSCTL_CONF),
            kubenet_template: STANDARD.encode(KUBENET_CNI_TEMPLATE),
            containerd_config_content: STANDARD.encode(CONTAINERD_TOML),

            kubelet_flags: default_kubelet_flags(),
            node_labels: default_node_labels(),
            agent_pool_name: DEFAULT_AGENT_POOL_NAME.to_string(),
        }
    }
}

fn default_kubelet_flags() -> BTreeMap<String, String> {
    [
        ("--address", "0.0.0.0"),
        ("--anonymous-auth", "false"),
        ("--authentication-token-webhook", "true"),
        ("--authorization-mode", "Webhook"),
        ("--azure-container-registry-config", "/etc/kubernetes/azure.json"),
        ("--cgroups-per-qos", "true"),
        ("--client-ca-file", "/etc/kubernetes/certs/ca.crt"),
        ("--cloud-config", "/etc/kubernetes/azure.json"),
        ("--cloud-provider", "external"),
        ("--cluster-dns", "10.0.0.10"),
        ("--cluster-domain", "cluster.local"),
        ("--enforce-node-allocatable", "pods"),
        ("--event-qps", "0"),
        ("--eviction-hard", "memory.available<750Mi,nodefs.available<10%,nodefs.inodesFree<5%"),
        ("--feature-gates", "CSIMigration=true,CSIMigrationAzureDisk=true,CSIMigrationAzureFile=true,DelegateFSGroupToCSIDriver=true,RotateKubeletServerCertificate=true"),
        ("--image-gc-high-threshold", "85"),
        ("--image-gc-low-threshold", "80"),
        ("--keep-terminated-pod-volumes", "false"),
        ("--kubeconfig", "/var/lib/kubelet/kubeconfig"),
        ("--max-pods", "110"),
        ("--node-status-update-frequency", "10s"),
        ("--pod-infra-container-image", "mcr.microsoft.com/oss/kubernetes/pause:3.6"),
        ("--pod-manifest-path", "/etc/kubernetes/manifests"),
        ("--pod-max-pids", "-1"),
        ("--protect-kernel-defaults", "true"),
        ("--read-only-port", "0"),
        ("--resolv-conf", "/run/systemd/resolve/resolv.conf"),
        ("--rotate-certificates", "true"),
        ("--streaming-connection-idle-timeout", "4h"),
        ("--tls-cert-file", "/etc/kubernetes/certs/kubeletserver.crt"),
        ("--tls-cipher-suites", "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305,TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305,TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,TLS_RSA_WITH_AES_256_GCM_SHA384,TLS_RSA_WITH_AES_128_GCM_SHA256"),
        ("--tls-private-key-file", "/etc/kubernetes/certs/kubeletserver.key"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_node_labels() -> BTreeMap<String, String> {
    BTreeMap::from([("kubernetes.azure.com/mode".to_string(), "system".to_string())])
}

// ── Computed inputs ───────────────────────────────────────────────

/// Identity and cluster facts resolved at runtime.
///
/// The string identity fields are required: synthesis fails with
/// `MissingRequiredInput` when any of them is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedInputs {
    pub tenant_id: String,
    pub subscription_id: String,
    pub user_assigned_identity_id: String,
    pub location: String,
    /// Node resource group; also the source of the cluster label.
    pub resource_group: String,
    /// Derives the NSG, VNet and route table names.
    pub cluster_id: String,
    pub api_server_name: String,
    /// One-time kubelet TLS bootstrap token.
    pub tls_bootstrap_token: String,
    /// Cluster CA certificate bundle.
    pub ca_bundle: String,
    pub kubernetes_version: String,
    /// Resolved through [`KubeBinaryTable`](crate::KubeBinaryTable).
    pub kube_binary_url: String,
    /// Cluster network plugin, e.g. `kubenet` or `azure`.
    pub network_plugin: String,
    /// Cluster network policy, e.g. `calico`; empty for none.
    pub network_policy: String,
    /// The VM size carries GPUs.
    pub gpu_node: bool,
}

// ── Overrides ─────────────────────────────────────────────────────

/// Taint effect, as understood by the kubelet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaintEffect::NoSchedule => "NoSchedule",
            TaintEffect::PreferNoSchedule => "PreferNoSchedule",
            TaintEffect::NoExecute => "NoExecute",
        }
    }
}

/// A node taint registered through `--register-with-taints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

impl fmt::Display for Taint {
    /// `key=value:Effect`, or `key:Effect` when the value is empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}:{}", self.key, self.effect.as_str())
        } else {
            write!(f, "{}={}:{}", self.key, self.value, self.effect.as_str())
        }
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default)]
    pub no_proxy: Vec<String>,
    /// PEM bundle trusted for the proxy.
    pub trusted_ca: Option<String>,
}

/// Transparent huge page settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransparentHugePage {
    /// `always`, `madvise` or `never`.
    #[serde(default)]
    pub enabled: String,
    /// `always`, `defer`, `defer+madvise`, `madvise` or `never`.
    #[serde(default)]
    pub defrag: String,
}

/// User-declared intent. Unset fields fall through to computed or static
/// values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub admin_username: Option<String>,
    pub agent_pool_name: Option<String>,
    pub taints: Vec<Taint>,
    /// Extra node labels; win over generated and base labels.
    pub labels: BTreeMap<String, String>,
    /// Extra kubelet flags; win over base flags.
    pub kubelet_flags: BTreeMap<String, String>,
    pub network_plugin: Option<String>,
    pub network_policy: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub custom_ca_certs: Option<Vec<String>>,
    /// Swap file size; zero disables swap.
    pub swap_file_size_mb: Option<u32>,
    pub transparent_huge_page: Option<TransparentHugePage>,
    pub disable_ssh: Option<bool>,
    pub message_of_the_day: Option<String>,
    pub gpu_instance_profile: Option<String>,
}
