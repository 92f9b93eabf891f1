//! redb table definitions for the desired-state store.

use redb::TableDefinition;

/// Machine records keyed by machine name, JSON values.
pub const MACHINES: TableDefinition<&str, &[u8]> = TableDefinition::new("machines");
