//! vmgrid-instance — the cloud instance gateway.
//!
//! Wraps the compute, network and extension APIs behind small capability
//! traits ([`api`]) and builds the provisioning workflow on top of them
//! ([`InstanceProvider`]): pick an offering, create the NIC and VM, tag
//! them for this cluster, and tear them down again.
//!
//! The provider doubles as the [`InventorySource`] the garbage collector
//! compares machine records against.

pub mod api;
pub mod convert;
pub mod error;
pub mod inventory;
pub mod labels;
pub mod models;
pub mod provider;

#[cfg(test)]
mod fake;

pub use api::{AzClient, NetworkInterfacesApi, VirtualMachineExtensionsApi, VirtualMachinesApi};
pub use convert::instance_to_machine;
pub use error::{InstanceError, InstanceResult};
pub use inventory::{InventoryEntry, InventorySource};
pub use labels::{constraints_for, zone_id};
pub use models::{Instance, NetworkInterface, VirtualMachine, VirtualMachineExtension};
pub use provider::{InstanceProvider, parse_provider_id, provider_id};
