//! Core type definitions for the projects service.
//!
//! This crate defines the pieces every other crate shares:
//! - [`ProjectRecord`], a free-form JSON document keyed by its package name
//! - [`ResolvedCountry`], the outcome of a client geolocation lookup
//! - the region visibility rules deciding whether `/br/:key` reveals a record
//!
//! Nothing in here performs I/O.

mod country;
mod record;
mod visibility;

pub use country::ResolvedCountry;
pub use record::ProjectRecord;
pub use visibility::{
    resolve_visibility, Decision, RegionGate, Visibility, DEFAULT_REGION, VISIBLE_CODE,
};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
