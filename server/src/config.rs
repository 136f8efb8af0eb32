//! Command-line and environment configuration.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use projects_geo::GeoConfig;
use projects_store::{MongoConfig, StoreResult};

#[derive(Parser, Debug, Clone)]
#[command(name = "projects-server")]
#[command(about = "Project record service with region-gated lookups")]
pub struct ServerConfig {
    /// HTTP port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Address to bind the HTTP listener to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Full MongoDB connection string; takes precedence over --db-host
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    /// MongoDB host, used when no connection string is given
    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    /// Database holding the projects collection
    #[arg(long, env = "DB_NAME", default_value = MongoConfig::DEFAULT_DATABASE)]
    pub db_name: String,

    #[arg(long, env = "DB_COLLECTION", default_value = MongoConfig::DEFAULT_COLLECTION)]
    pub collection: String,

    /// JSON file to store projects in when no database is configured
    #[arg(long, env = "DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Geolocation provider API key
    #[arg(long, env = "GEO_API_KEY", hide_env_values = true)]
    pub geo_api_key: Option<String>,

    /// Geolocation provider base URL
    #[arg(long, env = "GEO_BASE_URL")]
    pub geo_base_url: Option<String>,

    /// Seconds to wait for a geolocation answer
    #[arg(long, env = "GEO_TIMEOUT_SECS", default_value = "5")]
    pub geo_timeout_secs: u64,

    /// Redirect target for `/`
    #[arg(long, env = "WELCOME_URL")]
    pub welcome_url: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServerConfig {
    /// MongoDB settings, if any were given. A connection string wins over
    /// host/port/user/password parts.
    pub fn mongo_config(&self) -> StoreResult<Option<MongoConfig>> {
        let config = match (non_empty(&self.mongodb_uri), non_empty(&self.db_host)) {
            (Some(uri), _) => MongoConfig::from_uri(uri),
            (None, Some(host)) => MongoConfig::from_parts(
                host,
                self.db_port,
                non_empty(&self.db_user),
                non_empty(&self.db_password),
            )?,
            (None, None) => return Ok(None),
        };
        Ok(Some(config.with_namespace(&self.db_name, &self.collection)))
    }

    pub fn geo_config(&self) -> GeoConfig {
        GeoConfig {
            base_url: non_empty(&self.geo_base_url).map(str::to_string),
            api_key: non_empty(&self.geo_api_key).map(str::to_string),
            timeout: Duration::from_secs(self.geo_timeout_secs),
        }
    }

    pub fn welcome_url(&self) -> Option<String> {
        non_empty(&self.welcome_url).map(str::to_string)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
