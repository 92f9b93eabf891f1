//! Capability traits for the cloud compute and network APIs.
//!
//! One trait per resource kind, each exposing only the calls the
//! provisioning workflow makes. The SKU catalog is just another
//! capability ([`CatalogSource`]) so offering selection never depends on
//! which API generation serves it.

use std::sync::Arc;

use async_trait::async_trait;
use vmgrid_catalog::CatalogSource;

use crate::error::InstanceResult;
use crate::models::{NetworkInterface, VirtualMachine, VirtualMachineExtension};

#[async_trait]
pub trait VirtualMachinesApi: Send + Sync {
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        vm: VirtualMachine,
    ) -> InstanceResult<VirtualMachine>;

    async fn get(&self, resource_group: &str, vm_name: &str) -> InstanceResult<VirtualMachine>;

    async fn delete(&self, resource_group: &str, vm_name: &str) -> InstanceResult<()>;

    async fn list(&self, resource_group: &str) -> InstanceResult<Vec<VirtualMachine>>;
}

#[async_trait]
pub trait NetworkInterfacesApi: Send + Sync {
    async fn create_or_update(
        &self,
        resource_group: &str,
        nic_name: &str,
        nic: NetworkInterface,
    ) -> InstanceResult<NetworkInterface>;

    async fn get(&self, resource_group: &str, nic_name: &str) -> InstanceResult<NetworkInterface>;

    async fn delete(&self, resource_group: &str, nic_name: &str) -> InstanceResult<()>;
}

#[async_trait]
pub trait VirtualMachineExtensionsApi: Send + Sync {
    async fn create_or_update(
        &self,
        resource_group: &str,
        vm_name: &str,
        extension: VirtualMachineExtension,
    ) -> InstanceResult<VirtualMachineExtension>;
}

/// The set of cloud clients one provider works with.
#[derive(Clone)]
pub struct AzClient {
    pub virtual_machines: Arc<dyn VirtualMachinesApi>,
    pub network_interfaces: Arc<dyn NetworkInterfacesApi>,
    pub extensions: Arc<dyn VirtualMachineExtensionsApi>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl AzClient {
    pub fn new(
        virtual_machines: Arc<dyn VirtualMachinesApi>,
        network_interfaces: Arc<dyn NetworkInterfacesApi>,
        extensions: Arc<dyn VirtualMachineExtensionsApi>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            virtual_machines,
            network_interfaces,
            extensions,
            catalog,
        }
    }
}
