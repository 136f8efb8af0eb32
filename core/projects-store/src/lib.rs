//! Storage layer for project records.
//!
//! # Architecture
//!
//! - [`RecordStore`] is the durable backend contract: a key-value upsert
//!   store keyed by `packageName`. Implementations: [`MemoryStore`],
//!   [`JsonFileStore`] and [`MongoStore`].
//! - [`CachedStore`] fronts one backend with the process-wide read cache.
//!   It is seeded once at startup, updated before every durable write, and
//!   absorbs backend failures into [`WriteOutcome::CacheOnly`] or an empty
//!   read instead of raising them.

mod cached;
mod error;
mod json_file;
mod memory;
mod mongo;

pub use cached::CachedStore;
pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use mongo::{document_to_record, record_to_document, MongoConfig, MongoStore};

use async_trait::async_trait;
use projects_types::ProjectRecord;
use serde::Serialize;
use std::collections::HashMap;

/// All records, keyed by package name.
pub type RecordMap = HashMap<String, ProjectRecord>;

/// Durable key-value storage of project records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Fetches one record. Unknown keys are `Ok(None)`.
    async fn get(&self, key: &str) -> StoreResult<Option<ProjectRecord>>;

    /// Fetches every record.
    async fn get_all(&self) -> StoreResult<RecordMap>;

    /// Creates or wholly replaces the record stored under `key`.
    async fn put(&self, key: &str, record: &ProjectRecord) -> StoreResult<()>;

    /// Whether the backend is currently reachable.
    async fn is_connected(&self) -> bool;

    /// Releases connections held by the backend.
    async fn close(&self) {}
}

/// Result of a write through [`CachedStore::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Cached and durably stored.
    Committed,
    /// Cached, but the durable write failed. Readers still see the new value.
    CacheOnly(String),
    /// Nothing was stored.
    Failed(String),
}

impl WriteOutcome {
    /// True when readers will observe the written record.
    pub fn is_visible(&self) -> bool {
        !matches!(self, WriteOutcome::Failed(_))
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, WriteOutcome::Committed)
    }
}

/// Connectivity snapshot of the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub connected: bool,
    pub records: usize,
}
