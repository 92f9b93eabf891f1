//! Value types for the instance catalog.
//!
//! These are plain immutable values supplied by a [`CatalogSource`]. The
//! selector never mutates them.
//!
//! [`CatalogSource`]: crate::source::CatalogSource

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Resources ─────────────────────────────────────────────────────

/// Resource quantities for a VM SKU or a workload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// CPU in millicores.
    #[serde(default)]
    pub cpu_millis: u64,
    /// Memory in bytes.
    #[serde(default)]
    pub memory_bytes: u64,
    /// Number of GPUs.
    #[serde(default)]
    pub gpus: u32,
}

impl Resources {
    pub fn new(cpu_millis: u64, memory_bytes: u64, gpus: u32) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
            gpus,
        }
    }

    /// True if every quantity is at least the corresponding minimum.
    pub fn satisfies(&self, minimum: &Resources) -> bool {
        self.cpu_millis >= minimum.cpu_millis
            && self.memory_bytes >= minimum.memory_bytes
            && self.gpus >= minimum.gpus
    }

    pub fn is_zero(&self) -> bool {
        self.cpu_millis == 0 && self.memory_bytes == 0 && self.gpus == 0
    }
}

// ── Capacity type ─────────────────────────────────────────────────

/// Purchasing model for an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityType {
    /// Preemptible, usually cheaper.
    Spot,
    /// On-demand.
    Regular,
}

impl CapacityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityType::Spot => "spot",
            CapacityType::Regular => "regular",
        }
    }
}

impl fmt::Display for CapacityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapacityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(CapacityType::Spot),
            "regular" | "on-demand" => Ok(CapacityType::Regular),
            other => Err(format!("unknown capacity type: {other}")),
        }
    }
}

// ── Offering ──────────────────────────────────────────────────────

/// A priced, zoned purchase option for a single SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Hourly price; never negative.
    pub price: f64,
    /// Availability zone, e.g. `westus-2`.
    pub zone: String,
    pub capacity_type: CapacityType,
    /// Unavailable offerings are never selected.
    pub available: bool,
}

impl Offering {
    /// Available with a usable price.
    pub fn is_eligible(&self) -> bool {
        self.available && self.price.is_finite() && self.price >= 0.0
    }
}

// ── Instance type ─────────────────────────────────────────────────

/// A VM SKU and its offerings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    /// Unique SKU name, e.g. `Standard_D2s_v3`.
    pub name: String,
    pub capacity: Resources,
    /// Capacity left for workloads after system reservations.
    pub allocatable: Resources,
    /// Ordered; list order breaks price ties.
    #[serde(default)]
    pub offerings: Vec<Offering>,
}

impl InstanceType {
    /// Offerings that can currently be purchased.
    pub fn available_offerings(&self) -> impl Iterator<Item = &Offering> {
        self.offerings.iter().filter(|o| o.is_eligible())
    }

    /// True if at least one offering is available.
    pub fn has_available_offering(&self) -> bool {
        self.available_offerings().next().is_some()
    }
}
