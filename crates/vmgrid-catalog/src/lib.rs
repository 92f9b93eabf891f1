//! vmgrid-catalog — the instance catalog and offering selection.
//!
//! A catalog is an ordered list of [`InstanceType`]s (VM SKUs), each with
//! its capacity and a list of priced [`Offering`]s. The selector picks the
//! cheapest available offering that satisfies the caller's constraints.
//!
//! # Components
//!
//! - **`types`** — SKU, offering, capacity type and resource quantities
//! - **`selector`** — Cheapest-offering selection with a stable tie-break
//! - **`source`** — `CatalogSource` capability (cloud SKU API, static files)
//!
//! # Ordering
//!
//! Catalog order is a priority hint. Among offerings with equal price the
//! earliest SKU wins, then the earliest offering within that SKU:
//!
//! ```text
//! [D2s_v3: 0.10@westus-2, 0.10@westus-3]  [NV16as_v4: 0.10@westus-2]
//!            ^ selected
//! ```

pub mod error;
pub mod selector;
pub mod source;
pub mod types;

pub use error::{CatalogError, CatalogResult};
pub use selector::{Selection, SelectionConstraints, rank_offerings, select_offering};
pub use source::{CatalogSource, StaticCatalog};
pub use types::{CapacityType, InstanceType, Offering, Resources};
