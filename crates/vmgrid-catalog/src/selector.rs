//! Offering selection for provisioning decisions.
//!
//! Filters every (SKU, offering) pair by:
//! - **Availability**: unavailable offerings are never candidates
//! - **Zone / capacity type**: optional hard constraints
//! - **Resources**: the SKU's allocatable must cover the minimum request
//!
//! and picks the lowest price. Ties resolve to catalog order, then to
//! offering-list order, so the result is a pure function of the input.

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::types::{CapacityType, InstanceType, Offering, Resources};

/// Hard constraints for a selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionConstraints {
    /// Only offerings in this zone.
    pub zone: Option<String>,
    /// Only offerings with this capacity type.
    pub capacity_type: Option<CapacityType>,
    /// The SKU's allocatable resources must satisfy this minimum.
    pub min_resources: Resources,
}

impl SelectionConstraints {
    fn admits(&self, instance_type: &InstanceType, offering: &Offering) -> bool {
        if !offering.is_eligible() {
            return false;
        }
        if let Some(zone) = &self.zone
            && offering.zone != *zone
        {
            return false;
        }
        if let Some(ct) = self.capacity_type
            && offering.capacity_type != ct
        {
            return false;
        }
        instance_type.allocatable.satisfies(&self.min_resources)
    }
}

/// A chosen SKU and one of its offerings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub instance_type: &'a InstanceType,
    pub offering: &'a Offering,
}

impl Selection<'_> {
    pub fn price(&self) -> f64 {
        self.offering.price
    }
}

/// All eligible offerings, cheapest first.
///
/// The sort is stable, so equal prices keep catalog order and then
/// offering-list order. An empty result means nothing is eligible.
pub fn rank_offerings<'a>(
    catalog: &'a [InstanceType],
    constraints: &SelectionConstraints,
) -> Vec<Selection<'a>> {
    let mut candidates: Vec<Selection<'a>> = catalog
        .iter()
        .flat_map(|it| {
            it.offerings
                .iter()
                .filter(move |o| constraints.admits(it, o))
                .map(move |o| Selection {
                    instance_type: it,
                    offering: o,
                })
        })
        .collect();

    // Prices are finite here, so the fallback never fires.
    candidates.sort_by(|a, b| {
        a.price()
            .partial_cmp(&b.price())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

/// Select the cheapest eligible offering.
///
/// Returns `NoOfferingAvailable` for an empty catalog, an all-unavailable
/// catalog, or when the constraints exclude everything.
pub fn select_offering<'a>(
    catalog: &'a [InstanceType],
    constraints: &SelectionConstraints,
) -> CatalogResult<Selection<'a>> {
    let mut best: Option<Selection<'a>> = None;
    for instance_type in catalog {
        for offering in &instance_type.offerings {
            if !constraints.admits(instance_type, offering) {
                continue;
            }
            // Strict comparison keeps the earliest candidate on ties.
            if best.is_none_or(|b| offering.price < b.price()) {
                best = Some(Selection {
                    instance_type,
                    offering,
                });
            }
        }
    }

    match best {
        Some(selection) => {
            debug!(
                instance_type = %selection.instance_type.name,
                zone = %selection.offering.zone,
                capacity_type = %selection.offering.capacity_type,
                price = selection.offering.price,
                "selected offering"
            );
            Ok(selection)
        }
        None => Err(CatalogError::NoOfferingAvailable(format!(
            "{} instance types, zone={}, capacity_type={}",
            catalog.len(),
            constraints.zone.as_deref().unwrap_or("any"),
            constraints
                .capacity_type
                .map(|c| c.as_str())
                .unwrap_or("any"),
        ))),
    }
}
