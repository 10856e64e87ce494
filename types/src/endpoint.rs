//! Node endpoint and wallet identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base URL of a storage node, e.g. `https://cn1.example.org`.
///
/// Trailing slashes are stripped on construction so that the same node always
/// compares equal regardless of how the registry spelled it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim().trim_end_matches('/');
        Self(trimmed.to_string())
    }

    /// Return the raw endpoint string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Join a path onto this endpoint, e.g. `/health_check`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Endpoint {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A user's wallet public key. Replica nodes index user state by wallet.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wallet(String);

impl Wallet {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Wallet {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Wallet {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slashes() {
        assert_eq!(Endpoint::new("http://cn1:4000/"), Endpoint::new("http://cn1:4000"));
        assert_eq!(Endpoint::new(" http://cn1:4000// ").as_str(), "http://cn1:4000");
    }

    #[test]
    fn endpoint_url_joins_single_slash() {
        let e = Endpoint::new("http://cn1:4000/");
        assert_eq!(e.url("/health_check"), "http://cn1:4000/health_check");
        assert_eq!(e.url("users/batch_clock_status"), "http://cn1:4000/users/batch_clock_status");
    }

    #[test]
    fn endpoint_serializes_as_plain_string() {
        let json = serde_json::to_string(&Endpoint::new("http://a")).unwrap();
        assert_eq!(json, "\"http://a\"");
    }
}
