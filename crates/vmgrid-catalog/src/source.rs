//! Catalog sources.
//!
//! The selector only ever sees a `Vec<InstanceType>`. Where it came from
//! (the cloud SKU API, whatever its transport generation, or a JSON file)
//! is hidden behind [`CatalogSource`].

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::types::InstanceType;

/// Capability to list the instance types offered in a location.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Return the catalog in priority order.
    async fn list_instance_types(&self) -> CatalogResult<Vec<InstanceType>>;
}

/// A fixed catalog, typically loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    instance_types: Vec<InstanceType>,
}

impl StaticCatalog {
    pub fn new(instance_types: Vec<InstanceType>) -> Self {
        Self { instance_types }
    }

    /// Load a JSON array of instance types.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogError::Source(e.to_string()))?;
        let instance_types: Vec<InstanceType> =
            serde_json::from_str(&content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        debug!(?path, count = instance_types.len(), "static catalog loaded");
        Ok(Self::new(instance_types))
    }

    pub fn instance_types(&self) -> &[InstanceType] {
        &self.instance_types
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_instance_types(&self) -> CatalogResult<Vec<InstanceType>> {
        Ok(self.instance_types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn static_catalog_preserves_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "b", "capacity": {{}}, "allocatable": {{}}, "offerings": []}},
                {{"name": "a", "capacity": {{}}, "allocatable": {{}}}}
            ]"#
        )
        .unwrap();

        let catalog = StaticCatalog::from_file(file.path()).unwrap();
        let listed = catalog.list_instance_types().await.unwrap();
        let names: Vec<&str> = listed.iter().map(|it| it.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = StaticCatalog::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
