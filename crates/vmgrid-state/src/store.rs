//! StateStore — redb-backed persistence for machine records.
//!
//! Values are JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for testing).
//! Read-modify-write updates run inside a single write transaction, so
//! concurrent updaters serialize on redb's writer lock.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(MACHINES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Insert or replace a machine record.
    pub fn put_machine(&self, machine: &Machine) -> StateResult<()> {
        let value = serde_json::to_vec(machine).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(MACHINES).map_err(map_err!(Table))?;
            table
                .insert(machine.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(machine = %machine.name, "machine stored");
        Ok(())
    }

    pub fn get_machine(&self, name: &str) -> StateResult<Option<Machine>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MACHINES).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let machine: Machine =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(machine))
            }
            None => Ok(None),
        }
    }

    /// List all machines in name order.
    pub fn list_machines(&self) -> StateResult<Vec<Machine>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MACHINES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let machine: Machine =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(machine);
        }
        Ok(results)
    }

    /// Delete a machine by name. Returns true if it existed.
    pub fn delete_machine(&self, name: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(MACHINES).map_err(map_err!(Table))?;
            existed = table.remove(name).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(machine = %name, existed, "machine deleted");
        Ok(existed)
    }

    /// Read-modify-write a stored machine in one transaction.
    ///
    /// If `apply` fails the transaction is dropped and nothing is written.
    pub fn update_machine<F>(&self, name: &str, apply: F) -> StateResult<Machine>
    where
        F: FnOnce(&mut Machine) -> StateResult<()>,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(MACHINES).map_err(map_err!(Table))?;
            let bytes = table
                .get(name)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value().to_vec())
                .ok_or_else(|| StateError::NotFound(format!("machine {name}")))?;
            let mut machine: Machine =
                serde_json::from_slice(&bytes).map_err(map_err!(Deserialize))?;
            apply(&mut machine)?;
            let value = serde_json::to_vec(&machine).map_err(map_err!(Serialize))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
            updated = machine;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(updated)
    }

    /// Record the provider id of the VM backing a machine.
    ///
    /// Linking is idempotent for the same id; a different id is a conflict.
    pub fn link(&self, name: &str, provider_id: &str) -> StateResult<Machine> {
        let machine = self.update_machine(name, |machine| {
            match machine.provider_id() {
                Some(existing) if existing == provider_id => Ok(()),
                Some(existing) => Err(StateError::Conflict(format!(
                    "machine {name} already linked to {existing}"
                ))),
                None => {
                    machine.status.provider_id = Some(provider_id.to_string());
                    Ok(())
                }
            }
        })?;
        debug!(machine = %name, %provider_id, "machine linked");
        Ok(machine)
    }
}
