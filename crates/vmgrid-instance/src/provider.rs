//! Instance provider — the VM lifecycle behind a machine.
//!
//! `create` walks the ranked offerings for the machine and launches the
//! first one the cloud accepts:
//!
//! 1. create the NIC in the cluster subnet, or reuse one left by an
//!    interrupted launch
//! 2. create the VM with the bootstrap payload as custom data
//! 3. install the billing extension
//!
//! A launch that fails after the NIC exists removes whatever it created
//! before the next offering is tried.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};
use vmgrid_catalog::{CapacityType, CatalogError, InstanceType, Selection, rank_offerings};
use vmgrid_state::Machine;

use crate::api::AzClient;
use crate::error::{InstanceError, InstanceResult};
use crate::labels::{
    ANNOTATION_MANAGED_BY, LABEL_INSTANCE_TYPE, LABEL_PROVISIONER_NAME, LABEL_ZONE,
    constraints_for, zone_id,
};
use crate::models::{
    Instance, NetworkInterface, VirtualMachine, VirtualMachineExtension, priority_for,
};

pub const BILLING_EXTENSION_NAME: &str = "computeAksLinuxBilling";

const PROVIDER_ID_PREFIX: &str = "azure://";

/// Provider id of a VM resource id.
pub fn provider_id(resource_id: &str) -> String {
    format!("{PROVIDER_ID_PREFIX}{resource_id}")
}

/// VM name from a provider id.
///
/// Expects `azure:///subscriptions/.../virtualMachines/<name>`.
pub fn parse_provider_id(provider_id: &str) -> InstanceResult<String> {
    let invalid = || InstanceError::InvalidProviderId(provider_id.to_string());
    let resource_id = provider_id.strip_prefix(PROVIDER_ID_PREFIX).ok_or_else(invalid)?;
    let mut segments = resource_id.split('/').filter(|s| !s.is_empty());
    segments
        .by_ref()
        .find(|s| s.eq_ignore_ascii_case("virtualMachines"))
        .ok_or_else(invalid)?;
    segments.next().map(str::to_string).ok_or_else(invalid)
}

fn billing_extension(location: &str) -> VirtualMachineExtension {
    VirtualMachineExtension {
        name: BILLING_EXTENSION_NAME.to_string(),
        location: location.to_string(),
        publisher: "Microsoft.AKS".to_string(),
        type_: "Compute.AKS.Linux.Billing".to_string(),
        type_handler_version: "1.0".to_string(),
        tags: BTreeMap::new(),
    }
}

/// Creates, looks up, lists and deletes the VMs backing machines in one
/// resource group.
pub struct InstanceProvider {
    az: AzClient,
    location: String,
    resource_group: String,
    subnet_id: String,
    cluster_name: String,
}

impl InstanceProvider {
    pub fn new(
        az: AzClient,
        location: impl Into<String>,
        resource_group: impl Into<String>,
        subnet_id: impl Into<String>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            az,
            location: location.into(),
            resource_group: resource_group.into(),
            subnet_id: subnet_id.into(),
            cluster_name: cluster_name.into(),
        }
    }

    /// Current SKU catalog from the catalog capability.
    pub async fn instance_types(&self) -> InstanceResult<Vec<InstanceType>> {
        self.az
            .catalog
            .list_instance_types()
            .await
            .map_err(|e| InstanceError::Api(e.to_string()))
    }

    /// Launch a VM for `machine` on the cheapest offering the cloud accepts.
    pub async fn create(
        &self,
        machine: &Machine,
        instance_types: &[InstanceType],
        custom_data: &str,
    ) -> InstanceResult<Instance> {
        let constraints = constraints_for(machine)?;
        let mut last_err: InstanceError = CatalogError::NoOfferingAvailable(format!(
            "machine {}: {} instance types",
            machine.name,
            instance_types.len()
        ))
        .into();

        for selection in rank_offerings(instance_types, &constraints) {
            match self.launch(machine, selection, custom_data).await {
                Ok(instance) => return Ok(instance),
                Err(err) => {
                    warn!(
                        machine = %machine.name,
                        instance_type = %selection.instance_type.name,
                        zone = %selection.offering.zone,
                        error = %err,
                        "launch failed, trying next offering"
                    );
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }

    async fn launch(
        &self,
        machine: &Machine,
        selection: Selection<'_>,
        custom_data: &str,
    ) -> InstanceResult<Instance> {
        let name = machine.name.as_str();
        let capacity_type = selection.offering.capacity_type;
        let tags = self.tags_for(machine);

        let nic = self.ensure_nic(name, &tags).await?;

        let vm = VirtualMachine {
            id: None,
            name: name.to_string(),
            location: self.location.clone(),
            zones: zone_id(&selection.offering.zone)
                .map(|id| vec![id.to_string()])
                .unwrap_or_default(),
            vm_size: selection.instance_type.name.clone(),
            priority: priority_for(capacity_type).to_string(),
            eviction_policy: (capacity_type == CapacityType::Spot).then(|| "Delete".to_string()),
            custom_data: custom_data.to_string(),
            network_interface_id: nic.id,
            tags,
            provisioning_state: None,
        };
        let vm = match self
            .az
            .virtual_machines
            .create_or_update(&self.resource_group, name, vm)
            .await
        {
            Ok(vm) => vm,
            Err(err) => {
                self.cleanup_nic(name).await;
                return Err(err);
            }
        };

        if let Err(err) = self
            .az
            .extensions
            .create_or_update(&self.resource_group, name, billing_extension(&self.location))
            .await
        {
            self.cleanup_vm(name).await;
            self.cleanup_nic(name).await;
            return Err(err);
        }

        info!(
            machine = %name,
            instance_type = %vm.vm_size,
            zone = %selection.offering.zone,
            %capacity_type,
            "launched instance"
        );
        Ok(self.instance_from_vm(&vm))
    }

    /// The machine's NIC, created unless an earlier launch left one behind.
    async fn ensure_nic(
        &self,
        name: &str,
        tags: &BTreeMap<String, String>,
    ) -> InstanceResult<NetworkInterface> {
        match self
            .az
            .network_interfaces
            .get(&self.resource_group, name)
            .await
        {
            Ok(nic) => {
                debug!(machine = %name, nic = ?nic.id, "reusing network interface");
                return Ok(nic);
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        let nic = self
            .az
            .network_interfaces
            .create_or_update(
                &self.resource_group,
                name,
                NetworkInterface {
                    id: None,
                    name: name.to_string(),
                    location: self.location.clone(),
                    subnet_id: self.subnet_id.clone(),
                    tags: tags.clone(),
                },
            )
            .await?;
        debug!(machine = %name, nic = ?nic.id, "network interface created");
        Ok(nic)
    }

    async fn cleanup_vm(&self, name: &str) {
        match self
            .az
            .virtual_machines
            .delete(&self.resource_group, name)
            .await
        {
            Ok(()) => debug!(machine = %name, "removed vm of failed launch"),
            Err(err) if err.is_not_found() => {}
            Err(err) => warn!(machine = %name, error = %err, "failed to remove vm"),
        }
    }

    async fn cleanup_nic(&self, name: &str) {
        match self
            .az
            .network_interfaces
            .delete(&self.resource_group, name)
            .await
        {
            Ok(()) => debug!(machine = %name, "removed network interface of failed vm"),
            Err(err) if err.is_not_found() => {}
            Err(err) => warn!(machine = %name, error = %err, "failed to remove network interface"),
        }
    }

    pub async fn get(&self, provider_id: &str) -> InstanceResult<Instance> {
        let name = parse_provider_id(provider_id)?;
        let vm = self
            .az
            .virtual_machines
            .get(&self.resource_group, &name)
            .await?;
        Ok(self.instance_from_vm(&vm))
    }

    /// Delete the VM and then its NIC. Already-gone resources are fine.
    pub async fn delete(&self, provider_id: &str) -> InstanceResult<()> {
        let name = parse_provider_id(provider_id)?;
        if let Err(err) = self
            .az
            .virtual_machines
            .delete(&self.resource_group, &name)
            .await
            && !err.is_not_found()
        {
            return Err(err);
        }
        if let Err(err) = self
            .az
            .network_interfaces
            .delete(&self.resource_group, &name)
            .await
            && !err.is_not_found()
        {
            return Err(err);
        }
        info!(%provider_id, "deleted instance");
        Ok(())
    }

    /// VMs in the resource group managed by this cluster.
    pub async fn list(&self) -> InstanceResult<Vec<Instance>> {
        let vms = self
            .az
            .virtual_machines
            .list(&self.resource_group)
            .await?;
        Ok(vms
            .iter()
            .filter(|vm| vm.tags.get(ANNOTATION_MANAGED_BY) == Some(&self.cluster_name))
            .map(|vm| self.instance_from_vm(vm))
            .collect())
    }

    fn tags_for(&self, machine: &Machine) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::from([(
            ANNOTATION_MANAGED_BY.to_string(),
            self.cluster_name.clone(),
        )]);
        if let Some(provisioner) = machine.labels.get(LABEL_PROVISIONER_NAME) {
            tags.insert(LABEL_PROVISIONER_NAME.to_string(), provisioner.clone());
        }
        tags
    }

    fn instance_from_vm(&self, vm: &VirtualMachine) -> Instance {
        let zone = vm
            .zones
            .first()
            .map(|id| format!("{}-{id}", self.location));
        let mut labels = BTreeMap::from([(LABEL_INSTANCE_TYPE.to_string(), vm.vm_size.clone())]);
        if let Some(zone) = &zone {
            labels.insert(LABEL_ZONE.to_string(), zone.clone());
        }
        let capacity_type = if vm.priority.eq_ignore_ascii_case("spot") {
            CapacityType::Spot
        } else {
            CapacityType::Regular
        };
        Instance {
            name: vm.name.clone(),
            id: vm.id.as_deref().map(provider_id),
            instance_type: vm.vm_size.clone(),
            zone,
            capacity_type: Some(capacity_type),
            labels,
            tags: vm.tags.clone(),
            provisioning_state: vm.provisioning_state.clone(),
        }
    }
}
