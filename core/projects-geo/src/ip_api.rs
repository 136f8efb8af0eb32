//! ip-api.com lookup.
//!
//! Only `countryCode` is consumed; `status` is checked so that a "fail"
//! answer (reserved ranges, quota exhaustion) reads as unknown.

use async_trait::async_trait;
use projects_types::ResolvedCountry;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{GeoError, GeoLookup, GeoResult};

/// Settings for [`IpApiLookup`].
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Overrides the provider endpoint, e.g. for a proxy or a test server.
    pub base_url: Option<String>,
    /// Pro-tier key. Without one the free endpoint is used.
    pub api_key: Option<String>,
    /// Upper bound for one lookup.
    pub timeout: Duration,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    message: Option<String>,
}

/// [`GeoLookup`] backed by the ip-api.com JSON endpoint.
pub struct IpApiLookup {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl IpApiLookup {
    pub const FREE_BASE_URL: &'static str = "http://ip-api.com";
    pub const PRO_BASE_URL: &'static str = "https://pro.ip-api.com";

    pub fn new(config: GeoConfig) -> GeoResult<Self> {
        if config.timeout.is_zero() {
            return Err(GeoError::Config("geolocation timeout must be non-zero".into()));
        }
        let api_key = config.api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("No geolocation API key configured, using the rate-limited free endpoint");
        }

        let base_url = match config.base_url {
            Some(url) => url,
            None if api_key.is_some() => Self::PRO_BASE_URL.to_string(),
            None => Self::FREE_BASE_URL.to_string(),
        };
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GeoError::Config("geolocation base URL is empty".into()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn lookup(&self, ip: IpAddr) -> Result<ResolvedCountry, String> {
        let mut request = self
            .client
            .get(format!("{}/json/{}", self.base_url, ip))
            .query(&[("fields", "status,message,countryCode")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        let body: IpApiResponse = response.json().await.map_err(|e| e.to_string())?;

        if body.status.as_deref().is_some_and(|s| s != "success") {
            return Err(body.message.unwrap_or_else(|| "lookup failed".into()));
        }
        Ok(body
            .country_code
            .map(ResolvedCountry::known)
            .unwrap_or_default())
    }
}

#[async_trait]
impl GeoLookup for IpApiLookup {
    async fn resolve_country(&self, ip: Option<&str>) -> ResolvedCountry {
        let Some(raw) = ip.map(str::trim).filter(|s| !s.is_empty()) else {
            return ResolvedCountry::Unknown;
        };
        let Ok(addr) = raw.parse::<IpAddr>() else {
            debug!("Ignoring malformed client address {raw:?}");
            return ResolvedCountry::Unknown;
        };

        match self.lookup(addr).await {
            Ok(country) => {
                debug!("Resolved {addr} to {country}");
                country
            }
            Err(reason) => {
                warn!("Geolocation lookup for {addr} failed: {reason}");
                ResolvedCountry::Unknown
            }
        }
    }
}
