//! vmgrid-bootstrap — node bootstrap configuration for new VMs.
//!
//! Turns three layers of input into the opaque custom-data payload a VM
//! runs at first boot:
//!
//! ```text
//! StaticBaseline ─┐
//! ComputedInputs ─┼─ synthesize() ─► NodeBootstrapVariables ─ render() ─► base64 script
//! Overrides ──────┘
//! ```
//!
//! Precedence is override > computed > static. Every field of the
//! synthesized record has exactly one source, and the record is never
//! modified after synthesis.
//!
//! # Maps
//!
//! Node labels and kubelet flags are `BTreeMap`s end to end, so their
//! serialized forms (`k=v,k=v` and `k=v k=v`) are sorted by key and the
//! rendered payload is byte-for-byte reproducible.

pub mod error;
pub mod inputs;
pub mod kube_binary;
pub mod labels;
pub mod render;
pub mod synth;
pub mod variables;

pub use error::{BootstrapError, BootstrapResult};
pub use inputs::{ComputedInputs, Overrides, ProxyConfig, StaticBaseline, Taint, TaintEffect, TransparentHugePage};
pub use kube_binary::KubeBinaryTable;
pub use labels::normalize_resource_group_name_for_label;
pub use render::{render, render_script};
pub use synth::{ensure_no_dupe_promiscuous_bridge, synthesize};
pub use variables::NodeBootstrapVariables;
