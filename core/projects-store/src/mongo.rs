//! MongoDB backend.
//!
//! One document per record in `projectsDB.projects` by default. Documents are
//! addressed by their `packageName` field, never by `_id`, and `_id` is
//! stripped before a document leaves this module.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use projects_types::ProjectRecord;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::{RecordMap, RecordStore, StoreError, StoreResult};

/// Connection settings for [`MongoStore`].
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// How long the driver may wait for a reachable server per operation.
    pub server_selection_timeout: Duration,
}

impl MongoConfig {
    pub const DEFAULT_DATABASE: &'static str = "projectsDB";
    pub const DEFAULT_COLLECTION: &'static str = "projects";
    pub const DEFAULT_PORT: u16 = 27017;

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: Self::DEFAULT_DATABASE.to_string(),
            collection: Self::DEFAULT_COLLECTION.to_string(),
            server_selection_timeout: Duration::from_secs(5),
        }
    }

    /// Builds a `mongodb://` URI from its parts, percent-encoding credentials.
    pub fn from_parts(
        host: &str,
        port: Option<u16>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> StoreResult<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(StoreError::Config("database host is empty".into()));
        }
        let port = port.unwrap_or(Self::DEFAULT_PORT);
        let mut url = Url::parse(&format!("mongodb://{host}:{port}"))
            .map_err(|e| StoreError::Config(format!("invalid database host {host:?}: {e}")))?;

        match (user, password) {
            (Some(user), password) if !user.is_empty() => {
                url.set_username(user)
                    .map_err(|_| StoreError::Config("cannot set database user".into()))?;
                url.set_password(password)
                    .map_err(|_| StoreError::Config("cannot set database password".into()))?;
            }
            (_, Some(_)) => {
                return Err(StoreError::Config(
                    "database password given without a user".into(),
                ));
            }
            _ => {}
        }

        Ok(Self::from_uri(url.to_string()))
    }

    #[must_use]
    pub fn with_namespace(mut self, database: impl Into<String>, collection: impl Into<String>) -> Self {
        self.database = database.into();
        self.collection = collection.into();
        self
    }

    /// The URI with any password masked, safe to log.
    pub fn redacted_uri(&self) -> String {
        match Url::parse(&self.uri) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.to_string()
            }
            Err(_) => "<unparseable uri>".to_string(),
        }
    }
}

/// Record store over a MongoDB collection.
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
}

impl MongoStore {
    /// Builds the client. No connection is made until the first operation,
    /// so an unreachable server does not fail here.
    pub async fn connect(config: &MongoConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| StoreError::Config(format!("invalid MongoDB URI: {e}")))?;
        options.app_name = Some("projects-server".to_string());
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options)?;
        let collection = client
            .database(&config.database)
            .collection::<Document>(&config.collection);
        info!(
            "MongoDB client ready for {}.{} at {}",
            config.database,
            config.collection,
            config.redacted_uri()
        );
        Ok(Self { client, collection })
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<ProjectRecord>> {
        let found = self.collection.find_one(by_key(key)).await?;
        found.map(document_to_record).transpose()
    }

    async fn get_all(&self) -> StoreResult<RecordMap> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut records = RecordMap::new();
        while let Some(document) = cursor.try_next().await? {
            let record = document_to_record(document)?;
            match record.package_name() {
                Some(key) => {
                    records.insert(key.to_string(), record);
                }
                None => warn!("skipping project document without packageName"),
            }
        }
        Ok(records)
    }

    async fn put(&self, key: &str, record: &ProjectRecord) -> StoreResult<()> {
        let document = record_to_document(record)?;
        self.collection
            .replace_one(by_key(key), document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .is_ok()
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        info!("MongoDB client shut down");
    }
}

fn by_key(key: &str) -> Document {
    doc! { "packageName": key }
}

/// Converts a record to BSON. Fails for values BSON cannot hold, such as
/// unsigned integers above `i64::MAX`.
pub fn record_to_document(record: &ProjectRecord) -> StoreResult<Document> {
    bson::to_document(record.fields()).map_err(|e| StoreError::InvalidRecord(e.to_string()))
}

/// Converts a stored document to a record, dropping `_id`.
pub fn document_to_record(mut document: Document) -> StoreResult<ProjectRecord> {
    document.remove("_id");
    Ok(ProjectRecord::from_value(
        Bson::Document(document).into_relaxed_extjson(),
    )?)
}
