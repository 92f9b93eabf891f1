//! vmgridd library — configuration and subcommand plumbing for the
//! `vmgridd` binary.

pub mod commands;
pub mod config;
pub mod inventory;

pub use config::{ClusterConfig, ProvisionerConfig};
pub use inventory::FileInventory;
