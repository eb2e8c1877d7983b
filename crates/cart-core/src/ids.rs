//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally passing a session token where a
//! product identifier is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Session used when a request carries no session identifier.
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Request header carrying the client-supplied session identifier.
pub const SESSION_HEADER: &str = "X-Session-ID";

/// Query parameter carrying the session identifier.
pub const SESSION_QUERY_PARAM: &str = "session_id";

/// Opaque client-supplied session token.
///
/// Identifies the owner of a cart. It is not authenticated and grants no
/// capability beyond addressing a cart record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Resolve the session for a request.
    ///
    /// The header wins over the query parameter; empty values are ignored.
    /// Requests carrying neither fall back to [`DEFAULT_SESSION_ID`].
    pub fn resolve(header: Option<&str>, query: Option<&str>) -> Self {
        header
            .filter(|s| !s.is_empty())
            .or_else(|| query.filter(|s| !s.is_empty()))
            .map(Self::new)
            .unwrap_or_else(|| Self::new(DEFAULT_SESSION_ID))
    }

    /// Get the session ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Integer product identifier as used by cart line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(i64);

impl ProductId {
    /// Create a new product ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw integer value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for ProductId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_new() {
        let id = SessionId::new("abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_session_id_display() {
        let id = SessionId::new("display-test");
        assert_eq!(format!("{}", id), "display-test");
    }

    #[test]
    fn test_resolve_prefers_header() {
        let id = SessionId::resolve(Some("from-header"), Some("from-query"));
        assert_eq!(id.as_str(), "from-header");
    }

    #[test]
    fn test_resolve_falls_back_to_query() {
        let id = SessionId::resolve(Some(""), Some("from-query"));
        assert_eq!(id.as_str(), "from-query");
    }

    #[test]
    fn test_resolve_default_session() {
        assert_eq!(SessionId::resolve(None, None).as_str(), DEFAULT_SESSION_ID);
        assert_eq!(SessionId::resolve(Some(""), Some("")).as_str(), DEFAULT_SESSION_ID);
    }

    #[test]
    fn test_session_id_serialization() {
        let id = SessionId::new("serialize-me");
        let json = serde_json::to_string(&id).unwrap();

        assert_eq!(json, r#""serialize-me""#);

        let deserialized: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn test_product_id_parse() {
        assert_eq!("42".parse::<ProductId>().unwrap(), ProductId::new(42));
        assert_eq!(" 7 ".parse::<ProductId>().unwrap(), ProductId::new(7));
        assert!("abc".parse::<ProductId>().is_err());
    }

    #[test]
    fn test_product_id_serializes_as_integer() {
        let json = serde_json::to_string(&ProductId::new(42)).unwrap();
        assert_eq!(json, "42");
    }
}
