//! Error types for namespace dispatch.
//!
//! Two layers, following the dual-error pattern:
//! - [`ActionError`]: the uniform failure value every action reports. It
//!   carries the platform event the interpreter should raise, a message, a
//!   diagnostic payload and the wrapped cause.
//! - [`ExtensionError`]: registry, session and I/O failures surfaced to
//!   library consumers and the CLI.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::config::ERROR_EXECUTION_EVENT;
use crate::value::Value;

/// Boxed error used at the data-model and external-resource boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classification of an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The host has no active data-model binding.
    MissingDataModel,
    /// A required attribute/expression pair resolved to nothing.
    MissingParameter,
    /// Mutually exclusive literal and expression attributes were both set.
    ConflictingParameters,
    /// The data model failed to evaluate an expression attribute.
    Evaluation,
    /// The key-value store or input stream reported an error.
    ExternalEffect,
    /// A child element executed by the document root failed.
    DelegatedChild,
    /// The data model rejected a write to a location.
    Assignment,
    /// No element was supplied to a namespace.
    InvalidElement,
    /// A namespace module could not be loaded for an element.
    Load,
}

impl ErrorKind {
    /// Short machine-readable name, used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingDataModel => "missing_data_model",
            Self::MissingParameter => "missing_parameter",
            Self::ConflictingParameters => "conflicting_parameters",
            Self::Evaluation => "evaluation",
            Self::ExternalEffect => "external_effect",
            Self::DelegatedChild => "delegated_child",
            Self::Assignment => "assignment",
            Self::InvalidElement => "invalid_element",
            Self::Load => "load",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure reported by an action.
///
/// `data` is attached for observability only and is never consulted for
/// control flow. The original failure, if any, is available through
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActionError {
    /// Classification tag.
    pub kind: ErrorKind,
    /// Platform event the interpreter should raise (e.g. `error.execution`).
    pub event_name: String,
    /// Human-readable description.
    pub message: String,
    /// Diagnostic context: element name, resolved attribute values.
    pub data: BTreeMap<String, Value>,
    /// Wrapped original failure.
    #[source]
    pub cause: Option<BoxError>,
}

impl ActionError {
    /// Create an error raising `error.execution` for the given element.
    #[must_use]
    pub fn new(kind: ErrorKind, element: &str, message: impl Into<String>) -> Self {
        let mut data = BTreeMap::new();
        data.insert("element".to_string(), Value::from(element));
        Self {
            kind,
            event_name: ERROR_EXECUTION_EVENT.to_string(),
            message: message.into(),
            data,
            cause: None,
        }
    }

    /// The host has no data model to evaluate or store against.
    #[must_use]
    pub fn missing_data_model(namespace: &str, element: &str) -> Self {
        Self::new(
            ErrorKind::MissingDataModel,
            element,
            format!("No data model available for {namespace}"),
        )
    }

    /// Attach a diagnostic value.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Diagnostic value as a string slice, if it is a string.
    #[must_use]
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Main error type for registry, session and CLI operations.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// Namespace URI is empty or contains whitespace.
    #[error("Invalid namespace URI: '{0}'")]
    InvalidNamespaceUri(String),

    /// A loader is already registered for the URI.
    #[error("Namespace '{0}' is already registered")]
    DuplicateNamespace(String),

    /// No loader is registered for the URI.
    #[error("No loader registered for namespace '{0}'")]
    UnknownNamespace(String),

    /// The loader failed to construct its module.
    #[error("Failed to load namespace '{uri}': {message}")]
    LoadFailed {
        uri: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The session was already torn down.
    #[error("Namespace session has been unloaded")]
    SessionClosed,

    /// An action or document execution failed.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for extension operations.
pub type Result<T> = std::result::Result<T, ExtensionError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_action_error_defaults() {
        let err = ActionError::new(ErrorKind::MissingParameter, "get", "env:get requires name");
        assert_eq!(err.event_name, "error.execution");
        assert_eq!(err.to_string(), "env:get requires name");
        assert_eq!(err.data_str("element"), Some("get"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_action_error_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = ActionError::new(ErrorKind::ExternalEffect, "read", "Failed to read")
            .with_cause(io)
            .with_data("location", "answer");

        assert_eq!(err.data_str("location"), Some("answer"));
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("pipe closed"));
    }

    #[test]
    fn test_missing_data_model_message() {
        let err = ActionError::missing_data_model("env", "set");
        assert_eq!(err.kind, ErrorKind::MissingDataModel);
        assert_eq!(err.to_string(), "No data model available for env");
    }

    #[test]
    fn test_extension_error_display() {
        let err = ExtensionError::DuplicateNamespace("urn:x".to_string());
        assert_eq!(err.to_string(), "Namespace 'urn:x' is already registered");
    }

    #[test]
    fn test_action_error_is_transparent() {
        let action = ActionError::new(ErrorKind::Evaluation, "set", "Failed to evaluate expr");
        let err = ExtensionError::from(action);
        assert_eq!(err.to_string(), "Failed to evaluate expr");
    }
}
