//! Country codes resolved from client addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The country a request was resolved to, or `Unknown` when the lookup had
/// no address to work with or failed for any reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResolvedCountry {
    Known(String),
    #[default]
    Unknown,
}

impl ResolvedCountry {
    /// Wraps `code` as reported by the provider. Blank input resolves to
    /// `Unknown`.
    #[must_use]
    pub fn known(code: impl AsRef<str>) -> Self {
        let code = code.as_ref();
        if code.trim().is_empty() {
            Self::Unknown
        } else {
            Self::Known(code.to_string())
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Known(code) => Some(code),
            Self::Unknown => None,
        }
    }

    /// True when this is a known country exactly equal to `code`.
    pub fn is(&self, code: &str) -> bool {
        self.code() == Some(code)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for ResolvedCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(code) => write!(f, "{code}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}
