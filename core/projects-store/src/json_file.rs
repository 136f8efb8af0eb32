//! Single-file JSON backend.
//!
//! The file holds one pretty-printed object mapping package name to record.
//! A missing file is an empty store. Writes rewrite the whole file through a
//! sibling temp file and a rename so a crash never leaves it half written.

use async_trait::async_trait;
use projects_types::ProjectRecord;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{RecordMap, RecordStore, StoreError, StoreResult};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "projects.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// The file as written, including entries that are not records.
    async fn load_raw(&self) -> StoreResult<BTreeMap<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn load(&self) -> StoreResult<BTreeMap<String, ProjectRecord>> {
        let mut records = BTreeMap::new();
        for (key, value) in self.load_raw().await? {
            match ProjectRecord::from_value(value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(e) => warn!("skipping entry {key:?} in {}: {e}", self.path.display()),
            }
        }
        Ok(records)
    }

    async fn save(&self, entries: &BTreeMap<String, Value>) -> StoreResult<()> {
        let mut text = serde_json::to_string_pretty(entries)?;
        text.push('\n');
        let temp = self.temp_path();
        tokio::fs::write(&temp, text).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json-file"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<ProjectRecord>> {
        Ok(self.load().await?.remove(key))
    }

    async fn get_all(&self) -> StoreResult<RecordMap> {
        Ok(self.load().await?.into_iter().collect())
    }

    async fn put(&self, key: &str, record: &ProjectRecord) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        // Entries that are not records are written back untouched.
        let mut entries = self.load_raw().await.map_err(|e| match e {
            // Refuse to overwrite a file we could not parse.
            StoreError::Serialization(e) => StoreError::Io(std::io::Error::new(
                ErrorKind::InvalidData,
                format!("{} is corrupt: {e}", self.path.display()),
            )),
            other => other,
        })?;
        entries.insert(key.to_string(), record.clone().into_value());
        self.save(&entries).await
    }

    async fn is_connected(&self) -> bool {
        tokio::fs::metadata(self.parent_dir())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
