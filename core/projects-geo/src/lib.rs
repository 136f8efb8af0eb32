//! Geolocation lookup for the projects service.
//!
//! The rest of the service depends only on [`GeoLookup`]. Lookups never
//! fail: a missing or malformed address, a timeout, a transport error or an
//! unexpected response all resolve to [`ResolvedCountry::Unknown`].

mod ip_api;

pub use ip_api::{GeoConfig, IpApiLookup};
pub use projects_types::ResolvedCountry;

use async_trait::async_trait;
use thiserror::Error;

/// Result type for building lookup clients.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while constructing a lookup client.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Resolves a client address to a country code.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// `None` resolves to `Unknown` without any network traffic.
    async fn resolve_country(&self, ip: Option<&str>) -> ResolvedCountry;
}

/// Answers every lookup that has an address with the same country.
#[derive(Debug, Clone, Default)]
pub struct FixedLookup {
    country: ResolvedCountry,
}

impl FixedLookup {
    pub fn new(country: ResolvedCountry) -> Self {
        Self { country }
    }
}

#[async_trait]
impl GeoLookup for FixedLookup {
    async fn resolve_country(&self, ip: Option<&str>) -> ResolvedCountry {
        match ip {
            Some(_) => self.country.clone(),
            None => ResolvedCountry::Unknown,
        }
    }
}
