use async_trait::async_trait;
use projects_types::ProjectRecord;
use tokio::sync::RwLock;

use crate::{RecordMap, RecordStore, StoreResult};

/// Process-local backend with no durability. Used when no database is
/// configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<RecordMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `records`.
    pub fn with_records(records: RecordMap) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<ProjectRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn get_all(&self) -> StoreResult<RecordMap> {
        Ok(self.records.read().await.clone())
    }

    async fn put(&self, key: &str, record: &ProjectRecord) -> StoreResult<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        true
    }
}
