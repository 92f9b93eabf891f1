//! The desired-state client contract used by controllers.
//!
//! `patch` and `patch_status` take the record as the caller last read it
//! (`baseline`) alongside the caller's modified copy, in the style of a
//! merge patch: only what changed between the two is applied.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::store::StateStore;
use crate::types::Machine;

#[async_trait]
pub trait MachineClient: Send + Sync {
    async fn list(&self) -> StateResult<Vec<Machine>>;

    /// Apply label, annotation and deletion-flag changes.
    async fn patch(&self, updated: &Machine, baseline: &Machine) -> StateResult<()>;

    /// Replace the status sub-record.
    async fn patch_status(&self, updated: &Machine, baseline: &Machine) -> StateResult<()>;

    async fn delete(&self, machine: &Machine) -> StateResult<()>;
}

/// Apply the key-level difference between `updated` and `baseline` to `target`.
fn merge_map_diff(
    target: &mut BTreeMap<String, String>,
    updated: &BTreeMap<String, String>,
    baseline: &BTreeMap<String, String>,
) {
    for (key, value) in updated {
        if baseline.get(key) != Some(value) {
            target.insert(key.clone(), value.clone());
        }
    }
    for key in baseline.keys() {
        if !updated.contains_key(key) {
            target.remove(key);
        }
    }
}

#[async_trait]
impl MachineClient for StateStore {
    async fn list(&self) -> StateResult<Vec<Machine>> {
        self.list_machines()
    }

    async fn patch(&self, updated: &Machine, baseline: &Machine) -> StateResult<()> {
        self.update_machine(&baseline.name, |stored| {
            merge_map_diff(&mut stored.labels, &updated.labels, &baseline.labels);
            merge_map_diff(&mut stored.annotations, &updated.annotations, &baseline.annotations);
            if updated.deletion_requested != baseline.deletion_requested {
                stored.deletion_requested = updated.deletion_requested;
            }
            Ok(())
        })?;
        debug!(machine = %baseline.name, "machine patched");
        Ok(())
    }

    async fn patch_status(&self, updated: &Machine, baseline: &Machine) -> StateResult<()> {
        if let Some(linked) = baseline.provider_id()
            && updated.provider_id() != Some(linked)
        {
            return Err(StateError::Conflict(format!(
                "machine {} provider id is immutable",
                baseline.name
            )));
        }
        self.update_machine(&baseline.name, |stored| {
            if stored.status != baseline.status {
                return Err(StateError::Conflict(format!(
                    "machine {} status changed since read",
                    baseline.name
                )));
            }
            stored.status = updated.status.clone();
            Ok(())
        })?;
        debug!(machine = %baseline.name, "machine status patched");
        Ok(())
    }

    async fn delete(&self, machine: &Machine) -> StateResult<()> {
        if self.delete_machine(&machine.name)? {
            Ok(())
        } else {
            Err(StateError::NotFound(format!("machine {}", machine.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CONDITION_READY;
    use chrono::{TimeZone, Utc};

    fn seeded() -> (StateStore, Machine) {
        let store = StateStore::open_in_memory().unwrap();
        let mut machine = Machine::new("m-1");
        machine.labels.insert("keep".to_string(), "1".to_string());
        machine.labels.insert("drop".to_string(), "1".to_string());
        machine.status.provider_id = Some("azure:///vm-1".to_string());
        store.put_machine(&machine).unwrap();
        (store, machine)
    }

    #[tokio::test]
    async fn patch_merges_only_changed_keys() {
        let (store, baseline) = seeded();

        // Someone else adds a label after our read.
        store
            .update_machine("m-1", |m| {
                m.labels.insert("other".to_string(), "x".to_string());
                Ok(())
            })
            .unwrap();

        let mut updated = baseline.clone();
        updated.labels.remove("drop");
        updated
            .annotations
            .insert("NodeHeartBeatTimeStamp".to_string(), "now".to_string());
        store.patch(&updated, &baseline).await.unwrap();

        let stored = store.get_machine("m-1").unwrap().unwrap();
        assert_eq!(stored.labels.get("keep").map(String::as_str), Some("1"));
        assert_eq!(stored.labels.get("other").map(String::as_str), Some("x"));
        assert!(!stored.labels.contains_key("drop"));
        assert_eq!(stored.annotations["NodeHeartBeatTimeStamp"], "now");
    }

    #[tokio::test]
    async fn patch_status_conflicts_on_divergence() {
        let (store, baseline) = seeded();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut first = baseline.clone();
        first.mark_true(CONDITION_READY, now);
        store.patch_status(&first, &baseline).await.unwrap();

        // A second writer still holding the old baseline loses.
        let mut second = baseline.clone();
        second.mark_false(CONDITION_READY, "NodeNotReady", "", now);
        let err = store.patch_status(&second, &baseline).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(store.get_machine("m-1").unwrap().unwrap().is_happy());
    }

    #[tokio::test]
    async fn patch_status_keeps_provider_id() {
        let (store, baseline) = seeded();
        let mut updated = baseline.clone();
        updated.status.provider_id = Some("azure:///vm-2".to_string());
        assert!(store.patch_status(&updated, &baseline).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn patch_and_delete_of_missing_machine_are_not_found() {
        let store = StateStore::open_in_memory().unwrap();
        let ghost = Machine::new("ghost");
        assert!(store.patch(&ghost, &ghost).await.unwrap_err().is_not_found());
        assert!(store.patch_status(&ghost, &ghost).await.unwrap_err().is_not_found());
        assert!(store.delete(&ghost).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_removes_machine() {
        let (store, machine) = seeded();
        store.delete(&machine).await.unwrap();
        assert!(MachineClient::list(&store).await.unwrap().is_empty());
    }
}
