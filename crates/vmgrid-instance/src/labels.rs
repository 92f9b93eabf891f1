//! Well-known label, annotation and tag keys, and the mapping from machine
//! requirements to selection constraints.

use tracing::debug;
use vmgrid_catalog::{CapacityType, SelectionConstraints};
use vmgrid_state::Machine;

use crate::error::{InstanceError, InstanceResult};

pub const LABEL_INSTANCE_TYPE: &str = "node.kubernetes.io/instance-type";
pub const LABEL_ZONE: &str = "topology.kubernetes.io/zone";
pub const LABEL_CAPACITY_TYPE: &str = "karpenter.sh/capacity-type";
pub const LABEL_PROVISIONER_NAME: &str = "karpenter.sh/provisioner-name";

/// Tag and annotation naming the cluster that owns a VM.
pub const ANNOTATION_MANAGED_BY: &str = "vmgrid.io/managed-by";
/// Annotation carrying the provider id a machine was linked to.
pub const ANNOTATION_LINKED: &str = "vmgrid.io/linked";

/// Derive selection constraints from a machine's requirements and requests.
pub fn constraints_for(machine: &Machine) -> InstanceResult<SelectionConstraints> {
    let requirements = &machine.spec.requirements;
    let capacity_type = match requirements.get(LABEL_CAPACITY_TYPE) {
        Some(value) => Some(value.parse::<CapacityType>().map_err(|_| {
            InstanceError::InvalidRequirement {
                key: LABEL_CAPACITY_TYPE.to_string(),
                value: value.clone(),
            }
        })?),
        None => None,
    };
    let constraints = SelectionConstraints {
        zone: requirements.get(LABEL_ZONE).cloned(),
        capacity_type,
        min_resources: machine.spec.resources,
    };
    debug!(machine = %machine.name, ?constraints, "derived selection constraints");
    Ok(constraints)
}

/// Cloud zone id of a zone name: the suffix after the final `-`.
///
/// `westus-2` becomes `2`. A name without a `-` has no zone id.
pub fn zone_id(zone: &str) -> Option<&str> {
    zone.rsplit_once('-')
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
}
