//! Cloud inventory as the reconciler sees it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InstanceResult;
use crate::provider::InstanceProvider;

/// One live compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub provider_id: String,
    /// The cloud is already tearing this resource down.
    #[serde(default)]
    pub deleting: bool,
}

#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn list(&self) -> InstanceResult<Vec<InventoryEntry>>;
}

#[async_trait]
impl InventorySource for InstanceProvider {
    async fn list(&self) -> InstanceResult<Vec<InventoryEntry>> {
        let instances = InstanceProvider::list(self).await?;
        Ok(instances
            .into_iter()
            .filter_map(|instance| {
                let deleting = instance.is_deleting();
                instance.id.map(|provider_id| InventoryEntry {
                    provider_id,
                    deleting,
                })
            })
            .collect())
    }
}
