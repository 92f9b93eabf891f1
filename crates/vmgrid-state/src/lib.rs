//! vmgrid-state — desired-state store for vmgrid machines.
//!
//! Backed by [redb](https://docs.rs/redb). Each [`Machine`] record is
//! JSON-serialized into the `machines` table keyed by machine name.
//!
//! Controllers talk to the store through the [`MachineClient`] trait so
//! tests and other backends can stand in for it. A missing record
//! surfaces as [`StateError::NotFound`], a lost optimistic update as
//! [`StateError::Conflict`].
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod client;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use client::MachineClient;
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
