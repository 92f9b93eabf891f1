//! Instance → machine conversion.

use std::collections::BTreeMap;

use tracing::warn;
use vmgrid_catalog::InstanceType;
use vmgrid_state::{Machine, resource_list};

use crate::labels::{
    ANNOTATION_LINKED, ANNOTATION_MANAGED_BY, LABEL_CAPACITY_TYPE, LABEL_INSTANCE_TYPE,
    LABEL_PROVISIONER_NAME, LABEL_ZONE,
};
use crate::models::Instance;

/// Labels an instance type pins to exactly one value.
fn single_valued_labels(instance_type: &InstanceType) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::from([(LABEL_INSTANCE_TYPE.to_string(), instance_type.name.clone())]);

    let mut zones = instance_type.available_offerings().map(|o| o.zone.as_str());
    if let Some(first) = zones.next()
        && zones.all(|zone| zone == first)
    {
        labels.insert(LABEL_ZONE.to_string(), first.to_string());
    }

    let mut capacity_types = instance_type.available_offerings().map(|o| o.capacity_type);
    if let Some(first) = capacity_types.next()
        && capacity_types.all(|ct| ct == first)
    {
        labels.insert(LABEL_CAPACITY_TYPE.to_string(), first.to_string());
    }
    labels
}

/// Build the machine record describing a launched instance.
pub fn instance_to_machine(instance: &Instance, instance_type: Option<&InstanceType>) -> Machine {
    let mut machine = Machine::new(instance.name.clone());
    let mut labels = instance.labels.clone();
    let mut annotations = BTreeMap::new();

    if let Some(instance_type) = instance_type {
        labels.extend(single_valued_labels(instance_type));
        machine.status.capacity = resource_list(&instance_type.capacity);
        machine.status.allocatable = resource_list(&instance_type.allocatable);
    }
    if let Some(capacity_type) = instance.capacity_type {
        labels.insert(LABEL_CAPACITY_TYPE.to_string(), capacity_type.to_string());
    }
    if let Some(provisioner) = instance.tags.get(LABEL_PROVISIONER_NAME) {
        labels.insert(LABEL_PROVISIONER_NAME.to_string(), provisioner.clone());
    }
    if let Some(managed_by) = instance.tags.get(ANNOTATION_MANAGED_BY) {
        annotations.insert(ANNOTATION_MANAGED_BY.to_string(), managed_by.clone());
    }

    match &instance.id {
        Some(id) => {
            machine.status.provider_id = Some(id.clone());
            annotations.insert(ANNOTATION_LINKED.to_string(), id.clone());
        }
        None => warn!(instance = %instance.name, "instance has no provider id"),
    }

    machine.labels = labels;
    machine.annotations = annotations;
    machine
}
