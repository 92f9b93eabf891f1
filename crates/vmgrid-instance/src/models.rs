//! Cloud resource models exchanged with the compute and network APIs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vmgrid_catalog::CapacityType;

/// Provisioning state the cloud reports while a VM is being torn down.
pub const PROVISIONING_STATE_DELETING: &str = "Deleting";

/// VM priority string for a capacity type.
pub fn priority_for(capacity_type: CapacityType) -> &'static str {
    match capacity_type {
        CapacityType::Spot => "Spot",
        CapacityType::Regular => "Regular",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Resource id, assigned by the cloud on creation.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub location: String,
    /// Zone ids, e.g. `["2"]`. Empty for a non-zonal VM.
    #[serde(default)]
    pub zones: Vec<String>,
    pub vm_size: String,
    pub priority: String,
    #[serde(default)]
    pub eviction_policy: Option<String>,
    /// Base64 bootstrap payload run at first boot.
    #[serde(default)]
    pub custom_data: String,
    #[serde(default)]
    pub network_interface_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub location: String,
    pub subnet_id: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachineExtension {
    pub name: String,
    pub location: String,
    pub publisher: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub type_handler_version: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A launched VM as the provisioning workflow sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    pub name: String,
    /// Provider id (`azure://` + VM resource id) once the cloud assigned one.
    pub id: Option<String>,
    pub instance_type: String,
    pub zone: Option<String>,
    pub capacity_type: Option<CapacityType>,
    pub labels: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub provisioning_state: Option<String>,
}

impl Instance {
    pub fn is_deleting(&self) -> bool {
        self.provisioning_state.as_deref() == Some(PROVISIONING_STATE_DELETING)
    }
}
