//! Domain types for the desired-state store.
//!
//! A [`Machine`] is the orchestrator's intent record for one node. It is
//! JSON-serialized into the `machines` table keyed by name.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vmgrid_catalog::Resources;

/// Condition set on the backing VM's visibility in cloud inventory.
pub const CONDITION_READY: &str = "Ready";

/// Condition set once the backing VM has been created and linked.
pub const CONDITION_LAUNCHED: &str = "Launched";

pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_GPU: &str = "nvidia.com/gpu";

/// Named resource quantities. CPU is in millicores, memory in bytes.
pub type ResourceList = BTreeMap<String, u64>;

/// Convert catalog resources into a resource list, dropping zero quantities.
pub fn resource_list(resources: &Resources) -> ResourceList {
    [
        (RESOURCE_CPU, resources.cpu_millis),
        (RESOURCE_MEMORY, resources.memory_bytes),
        (RESOURCE_GPU, u64::from(resources.gpus)),
    ]
    .into_iter()
    .filter(|(_, quantity)| *quantity > 0)
    .map(|(name, quantity)| (name.to_string(), quantity))
    .collect()
}

// ── Conditions ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "True"),
            Self::False => write!(f, "False"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

// ── Machine ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Scheduling requirements, e.g. `topology.kubernetes.io/zone`.
    #[serde(default)]
    pub requirements: BTreeMap<String, String>,
    /// Minimum resources the node must offer.
    #[serde(default)]
    pub resources: Resources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    /// Cloud identifier of the backing VM. Set once, at link time.
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub capacity: ResourceList,
    #[serde(default)]
    pub allocatable: ResourceList,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Desired-state record for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Set when the orchestrator has asked for the machine to go away.
    #[serde(default)]
    pub deletion_requested: bool,
    #[serde(default)]
    pub spec: MachineSpec,
    #[serde(default)]
    pub status: MachineStatus,
}

impl Machine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn provider_id(&self) -> Option<&str> {
        self.status.provider_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn get_condition(&self, type_: &str) -> Option<&Condition> {
        self.status.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Set a condition to `True`, clearing reason and message.
    pub fn mark_true(&mut self, type_: &str, now: DateTime<Utc>) {
        self.set_condition(type_, ConditionStatus::True, "", "", now);
    }

    pub fn mark_false(&mut self, type_: &str, reason: &str, message: &str, now: DateTime<Utc>) {
        self.set_condition(type_, ConditionStatus::False, reason, message, now);
    }

    /// Upsert a condition. The transition time only moves when the status
    /// actually changes.
    pub fn set_condition(
        &mut self,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        now: DateTime<Utc>,
    ) {
        match self.status.conditions.iter_mut().find(|c| c.type_ == type_) {
            Some(existing) => {
                if existing.status != status {
                    existing.last_transition_time = now;
                }
                existing.status = status;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
            }
            None => self.status.conditions.push(Condition {
                type_: type_.to_string(),
                status,
                reason: reason.to_string(),
                message: message.to_string(),
                last_transition_time: now,
            }),
        }
    }

    pub fn is_launched(&self) -> bool {
        self.get_condition(CONDITION_LAUNCHED)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Aggregate health: the `Ready` condition is `True`.
    pub fn is_happy(&self) -> bool {
        self.get_condition(CONDITION_READY)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }
}
