//! Region-gated visibility.
//!
//! A record is revealed through the region-gated endpoint only when its
//! visibility code is on *and* its region gate admits the requester's
//! country:
//!
//! | `ip` field        | admitted countries          |
//! |-------------------|-----------------------------|
//! | absent            | [`DEFAULT_REGION`] only     |
//! | `""`              | every country, even unknown |
//! | `"C"`             | `C` only                    |
//! | not a string      | none                        |
//!
//! Unknown countries never satisfy a country-specific gate.

use crate::country::ResolvedCountry;
use crate::record::ProjectRecord;

/// Region applied to records that carry no `ip` field.
pub const DEFAULT_REGION: &str = "BR";

/// The only `code` value that makes a record visible.
pub const VISIBLE_CODE: &str = "2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Which requesting countries a record may be revealed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionGate {
    /// No `ip` field: the legacy [`DEFAULT_REGION`] gate.
    Default,
    /// `ip == ""`: no region restriction.
    Open,
    /// `ip == C`: only requests resolved to `C`.
    Country(String),
    /// `ip` present but not a string.
    Closed,
}

impl RegionGate {
    pub fn admits(&self, country: &ResolvedCountry) -> bool {
        match self {
            Self::Default => country.is(DEFAULT_REGION),
            Self::Open => true,
            Self::Country(code) => country.is(code),
            Self::Closed => false,
        }
    }
}

/// Outcome of [`resolve_visibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Expose,
    Deny,
}

impl Decision {
    pub fn is_exposed(self) -> bool {
        self == Self::Expose
    }
}

/// Decides whether `record` may be shown to a requester from `country`.
pub fn resolve_visibility(record: &ProjectRecord, country: &ResolvedCountry) -> Decision {
    if record.visibility() == Visibility::Visible && record.region_gate().admits(country) {
        Decision::Expose
    } else {
        Decision::Deny
    }
}
