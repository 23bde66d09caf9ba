//! Configuration constants and validation functions.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ExtensionError, Result};

/// Platform event raised for every action failure.
pub const ERROR_EXECUTION_EVENT: &str = "error.execution";

/// Default `tracing` filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Attribute prefix declaring a namespace alias on the document root.
///
/// `use:memory="urn:…"` is equivalent to `xmlns:memory="urn:…"`.
pub const USE_PREFIX: &str = "use:";

/// Companion attribute carrying an event payload schema on transitions.
pub const EVENT_SCHEMA_ATTRIBUTE: &str = "event:schema";

/// Namespace URI: no whitespace, at least one character.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAMESPACE_URI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+$").expect("valid regex"));

/// Alias prefix: an XML NCName (no colon).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ALIAS_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._-]*$").expect("valid regex"));

/// Data-model location: identifiers joined by dots.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LOCATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$").expect("valid regex")
});

/// Validate a namespace URI before registration.
///
/// # Examples
/// ```
/// use scxml_extensions::config::validate_namespace_uri;
///
/// assert!(validate_namespace_uri("urn:scxml-ext:env").is_ok());
/// assert!(validate_namespace_uri("").is_err());
/// assert!(validate_namespace_uri("has space").is_err());
/// ```
pub fn validate_namespace_uri(uri: &str) -> Result<()> {
    if NAMESPACE_URI_PATTERN.is_match(uri) {
        Ok(())
    } else {
        Err(ExtensionError::InvalidNamespaceUri(uri.to_string()))
    }
}

/// Check whether a `use:` alias prefix is a valid NCName.
///
/// # Examples
/// ```
/// use scxml_extensions::config::is_valid_alias_prefix;
///
/// assert!(is_valid_alias_prefix("memory"));
/// assert!(!is_valid_alias_prefix("1st"));
/// assert!(!is_valid_alias_prefix(""));
/// ```
pub fn is_valid_alias_prefix(prefix: &str) -> bool {
    ALIAS_PREFIX_PATTERN.is_match(prefix)
}

/// Check whether a data-model location is a dotted identifier path.
///
/// # Examples
/// ```
/// use scxml_extensions::config::is_valid_location;
///
/// assert!(is_valid_location("user.name"));
/// assert!(!is_valid_location("user..name"));
/// assert!(!is_valid_location("1abc"));
/// ```
pub fn is_valid_location(location: &str) -> bool {
    LOCATION_PATTERN.is_match(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_namespace_uri() {
        assert!(validate_namespace_uri("urn:scxml-ext:stdin").is_ok());
        assert!(validate_namespace_uri("https://example.org/ns/env").is_ok());
        assert!(validate_namespace_uri(" urn:x").is_err());
        assert!(validate_namespace_uri("urn:x\n").is_err());
    }

    #[test]
    fn test_alias_prefix() {
        assert!(is_valid_alias_prefix("ollama"));
        assert!(is_valid_alias_prefix("_private.v2"));
        assert!(!is_valid_alias_prefix("a:b"));
    }

    #[test]
    fn test_location() {
        assert!(is_valid_location("answer"));
        assert!(is_valid_location("$state._x"));
        assert!(!is_valid_location(""));
        assert!(!is_valid_location("a b"));
    }
}
