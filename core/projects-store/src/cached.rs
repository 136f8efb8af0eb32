//! The process-wide record cache in front of a durable backend.
//!
//! Reads prefer the cache. Writes land in the cache first and then in the
//! backend; a backend that is down only costs durability, never
//! availability. The cache and the backend are not updated atomically.
//!
//! After a failed backend read, cache misses and seed retries skip the
//! backend for [`CachedStore::DEFAULT_READ_BACKOFF`], so an unreachable
//! database does not stall every request on its connection timeout.

use projects_types::ProjectRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{RecordMap, RecordStore, StoreError, StoreHealth, WriteOutcome};

pub struct CachedStore {
    backend: Box<dyn RecordStore>,
    cache: RwLock<RecordMap>,
    /// Set once the cache holds a full snapshot of the backend.
    seeded: AtomicBool,
    /// When the last backend read failed, if it has not succeeded since.
    read_failed_at: Mutex<Option<Instant>>,
    read_backoff: Duration,
    health_timeout: Duration,
}

impl CachedStore {
    pub const DEFAULT_READ_BACKOFF: Duration = Duration::from_secs(30);
    pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(1);

    pub fn new(backend: impl RecordStore + 'static) -> Self {
        Self::from_boxed(Box::new(backend))
    }

    pub fn from_boxed(backend: Box<dyn RecordStore>) -> Self {
        Self {
            backend,
            cache: RwLock::new(RecordMap::new()),
            seeded: AtomicBool::new(false),
            read_failed_at: Mutex::new(None),
            read_backoff: Self::DEFAULT_READ_BACKOFF,
            health_timeout: Self::DEFAULT_HEALTH_TIMEOUT,
        }
    }

    /// How long reads skip the backend after one fails.
    #[must_use]
    pub fn with_read_backoff(mut self, backoff: Duration) -> Self {
        self.read_backoff = backoff;
        self
    }

    /// Upper bound for the connectivity probe in [`health`](Self::health).
    #[must_use]
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Loads every backend record into the cache. Returns the number loaded.
    ///
    /// On failure the cache is left as it was and the error is logged; a
    /// later [`get_all`](Self::get_all) retries the load once the read
    /// back-off has passed. Calling `seed` directly always tries.
    pub async fn seed(&self) -> usize {
        match self.backend.get_all().await {
            Ok(records) => {
                self.note_read_ok().await;
                let loaded = self.merge(records).await;
                self.seeded.store(true, Ordering::Release);
                info!("Loaded {} projects from {}", loaded, self.backend_name());
                loaded
            }
            Err(e) => {
                self.note_read_failed().await;
                warn!(
                    "Could not load projects from {}, serving from an empty cache: {}",
                    self.backend_name(),
                    e
                );
                0
            }
        }
    }

    async fn backend_readable(&self) -> bool {
        match *self.read_failed_at.lock().await {
            Some(at) => at.elapsed() >= self.read_backoff,
            None => true,
        }
    }

    async fn note_read_ok(&self) {
        *self.read_failed_at.lock().await = None;
    }

    async fn note_read_failed(&self) {
        *self.read_failed_at.lock().await = Some(Instant::now());
    }

    /// Inserts backend records without clobbering anything written since.
    async fn merge(&self, records: RecordMap) -> usize {
        let mut cache = self.cache.write().await;
        let loaded = records.len();
        for (key, record) in records {
            cache.entry(key).or_insert(record);
        }
        loaded
    }

    /// Looks up one record. Backend errors read as absent.
    pub async fn get(&self, key: &str) -> Option<ProjectRecord> {
        if let Some(record) = self.cache.read().await.get(key) {
            return Some(record.clone());
        }
        if !self.backend_readable().await {
            debug!("Skipping {} lookup of {key:?} during read back-off", self.backend_name());
            return None;
        }

        match self.backend.get(key).await {
            Ok(Some(record)) => {
                self.note_read_ok().await;
                let mut cache = self.cache.write().await;
                Some(cache.entry(key.to_string()).or_insert(record).clone())
            }
            Ok(None) => {
                self.note_read_ok().await;
                None
            }
            Err(e) => {
                self.note_read_failed().await;
                warn!("Lookup of {key:?} in {} failed: {e}", self.backend_name());
                None
            }
        }
    }

    /// Snapshot of all records.
    pub async fn get_all(&self) -> RecordMap {
        if !self.seeded.load(Ordering::Acquire) && self.backend_readable().await {
            self.seed().await;
        }
        self.cache.read().await.clone()
    }

    /// Upserts `record` under `key`, stamping its `packageName` with `key`.
    pub async fn put(&self, key: &str, record: ProjectRecord) -> WriteOutcome {
        let record = record.with_package_name(key);
        let previous = self
            .cache
            .write()
            .await
            .insert(key.to_string(), record.clone());

        match self.backend.put(key, &record).await {
            Ok(()) => {
                debug!("Saved project {key:?} to {}", self.backend_name());
                WriteOutcome::Committed
            }
            Err(StoreError::InvalidRecord(reason)) => {
                self.rollback(key, &record, previous).await;
                error!("{} rejected project {key:?}: {reason}", self.backend_name());
                WriteOutcome::Failed(reason)
            }
            Err(e) => {
                warn!(
                    "Project {key:?} cached but not persisted to {}: {e}",
                    self.backend_name()
                );
                WriteOutcome::CacheOnly(e.to_string())
            }
        }
    }

    /// Restores the pre-write value unless another writer has replaced ours.
    async fn rollback(&self, key: &str, written: &ProjectRecord, previous: Option<ProjectRecord>) {
        let mut cache = self.cache.write().await;
        if cache.get(key) != Some(written) {
            return;
        }
        match previous {
            Some(previous) => {
                cache.insert(key.to_string(), previous);
            }
            None => {
                cache.remove(key);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn health(&self) -> StoreHealth {
        StoreHealth {
            backend: self.backend_name(),
            connected: self.probe_backend().await,
            records: self.len().await,
        }
    }

    async fn probe_backend(&self) -> bool {
        match tokio::time::timeout(self.health_timeout, self.backend.is_connected()).await {
            Ok(connected) => connected,
            Err(_) => {
                debug!(
                    "{} connectivity probe timed out after {:?}",
                    self.backend_name(),
                    self.health_timeout
                );
                false
            }
        }
    }

    pub async fn close(&self) {
        self.backend.close().await;
    }
}
