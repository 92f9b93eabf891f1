//! File-backed cloud inventory.

use std::path::PathBuf;

use async_trait::async_trait;
use vmgrid_instance::{InstanceError, InstanceResult, InventoryEntry, InventorySource};

/// Inventory read from a JSON array of `{provider_id, deleting}` on every
/// list, so edits to the file show up on the next pass.
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl InventorySource for FileInventory {
    async fn list(&self) -> InstanceResult<Vec<InventoryEntry>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| InstanceError::Api(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| InstanceError::Api(format!("{}: {e}", self.path.display())))
    }
}
