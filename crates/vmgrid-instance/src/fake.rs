//! In-memory cloud used by the crate's tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vmgrid_catalog::{CapacityType, InstanceType, Offering, Resources, StaticCatalog};

use crate::api::{AzClient, NetworkInterfacesApi, VirtualMachineExtensionsApi, VirtualMachinesApi};
use crate::error::{InstanceError, InstanceResult};
use crate::labels::ANNOTATION_MANAGED_BY;
use crate::models::{NetworkInterface, VirtualMachine, VirtualMachineExtension};
use crate::provider::InstanceProvider;

pub(crate) fn offering(price: f64, zone: &str, capacity_type: CapacityType) -> Offering {
    Offering {
        price,
        zone: zone.to_string(),
        capacity_type,
        available: true,
    }
}

pub(crate) fn sku(name: &str, offerings: Vec<Offering>) -> InstanceType {
    InstanceType {
        name: name.to_string(),
        capacity: Resources::new(4000, 16 << 30, 0),
        allocatable: Resources::new(3800, 14 << 30, 0),
        offerings,
    }
}

#[derive(Default)]
struct CloudState {
    vms: BTreeMap<String, VirtualMachine>,
    nics: BTreeMap<String, NetworkInterface>,
    extensions: Vec<(String, String)>,
    rejected_sizes: BTreeSet<String>,
    failing_extensions: bool,
    nic_deletes: usize,
    nic_creates: usize,
}

#[derive(Clone, Default)]
pub(crate) struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

fn resource_id(kind: &str, name: &str) -> String {
    format!("/subscriptions/sub/resourceGroups/rg/providers/{kind}/{name}")
}

impl FakeCloud {
    pub(crate) fn provider(&self) -> InstanceProvider {
        self.provider_with_catalog(vec![])
    }

    pub(crate) fn provider_with_catalog(&self, catalog: Vec<InstanceType>) -> InstanceProvider {
        let az = AzClient::new(
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(self.clone()),
            Arc::new(StaticCatalog::new(catalog)),
        );
        InstanceProvider::new(az, "westus", "rg", "subnet-id", "test-cluster")
    }

    pub(crate) fn fail_extensions(&self) {
        self.state.lock().unwrap().failing_extensions = true;
    }

    pub(crate) fn vm_count(&self) -> usize {
        self.state.lock().unwrap().vms.len()
    }

    pub(crate) fn reject_size(&self, size: &str) {
        self.state.lock().unwrap().rejected_sizes.insert(size.to_string());
    }

    pub(crate) fn vm(&self, name: &str) -> Option<VirtualMachine> {
        self.state.lock().unwrap().vms.get(name).cloned()
    }

    pub(crate) fn nic(&self, name: &str) -> Option<NetworkInterface> {
        self.state.lock().unwrap().nics.get(name).cloned()
    }

    pub(crate) fn nic_creates(&self) -> usize {
        self.state.lock().unwrap().nic_creates
    }

    pub(crate) fn nic_deletes(&self) -> usize {
        self.state.lock().unwrap().nic_deletes
    }

    pub(crate) fn extensions(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().extensions.clone()
    }

    pub(crate) fn set_provisioning_state(&self, name: &str, state: &str) {
        if let Some(vm) = self.state.lock().unwrap().vms.get_mut(name) {
            vm.provisioning_state = Some(state.to_string());
        }
    }

    pub(crate) fn insert_unmanaged_vm(&self, name: &str) {
        let vm = VirtualMachine {
            id: Some(resource_id("Microsoft.Compute/virtualMachines", name)),
            name: name.to_string(),
            location: "westus".to_string(),
            vm_size: "Standard_D2s_v3".to_string(),
            priority: "Regular".to_string(),
            tags: BTreeMap::from([(ANNOTATION_MANAGED_BY.to_string(), "other".to_string())]),
            ..Default::default()
        };
        self.state.lock().unwrap().vms.insert(name.to_string(), vm);
    }
}

#[async_trait]
impl VirtualMachinesApi for FakeCloud {
    async fn create_or_update(
        &self,
        _resource_group: &str,
        vm_name: &str,
        mut vm: VirtualMachine,
    ) -> InstanceResult<VirtualMachine> {
        let mut state = self.state.lock().unwrap();
        if state.rejected_sizes.contains(&vm.vm_size) {
            return Err(InstanceError::Api(format!("SkuNotAvailable: {}", vm.vm_size)));
        }
        vm.id = Some(resource_id("Microsoft.Compute/virtualMachines", vm_name));
        vm.provisioning_state = Some("Succeeded".to_string());
        state.vms.insert(vm_name.to_string(), vm.clone());
        Ok(vm)
    }

    async fn get(&self, _resource_group: &str, vm_name: &str) -> InstanceResult<VirtualMachine> {
        self.vm(vm_name)
            .ok_or_else(|| InstanceError::NotFound(format!("vm {vm_name}")))
    }

    async fn delete(&self, _resource_group: &str, vm_name: &str) -> InstanceResult<()> {
        match self.state.lock().unwrap().vms.remove(vm_name) {
            Some(_) => Ok(()),
            None => Err(InstanceError::NotFound(format!("vm {vm_name}"))),
        }
    }

    async fn list(&self, _resource_group: &str) -> InstanceResult<Vec<VirtualMachine>> {
        Ok(self.state.lock().unwrap().vms.values().cloned().collect())
    }
}

#[async_trait]
impl NetworkInterfacesApi for FakeCloud {
    async fn create_or_update(
        &self,
        _resource_group: &str,
        nic_name: &str,
        mut nic: NetworkInterface,
    ) -> InstanceResult<NetworkInterface> {
        nic.id = Some(resource_id("Microsoft.Network/networkInterfaces", nic_name));
        let mut state = self.state.lock().unwrap();
        state.nic_creates += 1;
        state.nics.insert(nic_name.to_string(), nic.clone());
        Ok(nic)
    }

    async fn get(&self, _resource_group: &str, nic_name: &str) -> InstanceResult<NetworkInterface> {
        self.nic(nic_name)
            .ok_or_else(|| InstanceError::NotFound(format!("nic {nic_name}")))
    }

    async fn delete(&self, _resource_group: &str, nic_name: &str) -> InstanceResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.nics.remove(nic_name) {
            Some(_) => {
                state.nic_deletes += 1;
                Ok(())
            }
            None => Err(InstanceError::NotFound(format!("nic {nic_name}"))),
        }
    }
}

#[async_trait]
impl VirtualMachineExtensionsApi for FakeCloud {
    async fn create_or_update(
        &self,
        _resource_group: &str,
        vm_name: &str,
        extension: VirtualMachineExtension,
    ) -> InstanceResult<VirtualMachineExtension> {
        let mut state = self.state.lock().unwrap();
        if state.failing_extensions {
            return Err(InstanceError::Api(format!("extension {} failed", extension.name)));
        }
        state
            .extensions
            .push((vm_name.to_string(), extension.name.clone()));
        Ok(extension)
    }
}
