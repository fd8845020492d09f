//! Unified error handling for palaver crates.
//!
//! This module provides a single error type [`PalaverError`] used across the
//! server runtime and tool implementations. Every failure carries an
//! [`ErrorKind`] so callers can branch programmatically instead of matching
//! on message strings.
//!
//! ## Example
//!
//! ```rust
//! use palaver_protocol::{ErrorKind, PalaverError, PalaverResult};
//!
//! fn lookup(title: &str) -> PalaverResult<String> {
//!     Err(PalaverError::not_found(format!("article '{title}' not found")))
//! }
//!
//! assert_eq!(lookup("Missing").unwrap_err().kind, ErrorKind::NotFound);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for palaver operations.
pub type PalaverResult<T> = std::result::Result<T, PalaverError>;

/// Unified error type for tool invocations and the callback channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalaverError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Operation being performed when the error occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

/// Error classification for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Tool arguments failed validation.
    InvalidInput,
    /// A referenced entity (e.g. an article) does not exist.
    NotFound,
    /// No tool is registered under the requested name.
    ToolNotFound,
    /// The client declined a sampling request or its model call failed.
    SamplingUnavailable,
    /// User-supplied disambiguation input matched neither a title substring
    /// nor a valid index. Distinct from [`ErrorKind::NotFound`].
    AmbiguousSelection,
    /// An operation exceeded its deadline.
    Timeout,
    /// The invocation was cancelled by the client.
    Cancelled,
    /// A backing data source was unreachable or returned garbage.
    ExternalService,
    /// Serialization or deserialization failed.
    Serialization,
    /// Unrecoverable internal state.
    Internal,
}

impl PalaverError {
    /// Create a new error with kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
        }
    }

    /// Attach the operation that was in progress.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Tool arguments failed validation.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// A referenced entity does not exist.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// No tool registered under the requested name.
    #[must_use]
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::ToolNotFound, format!("tool '{name}' not found"))
    }

    /// The client cannot or will not service a sampling request.
    #[must_use]
    pub fn sampling_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SamplingUnavailable, message)
    }

    /// Selection input matched neither substring nor index.
    #[must_use]
    pub fn ambiguous_selection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AmbiguousSelection, message)
    }

    /// Operation exceeded its deadline.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Invocation cancelled by the client.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Backing data source failed.
    #[must_use]
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Serialization or deserialization failed.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Unrecoverable internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether the tool may sensibly degrade instead of propagating.
    ///
    /// Suspension failures (sampling unavailable, timeouts) are recoverable
    /// per-tool; external-service and internal failures are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::SamplingUnavailable | ErrorKind::Timeout | ErrorKind::AmbiguousSelection
        )
    }
}

impl fmt::Display for PalaverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Some(op) => write!(f, "{:?} ({op}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for PalaverError {}

impl From<serde_json::Error> for PalaverError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(
            PalaverError::invalid_input("bad").kind,
            ErrorKind::InvalidInput
        );
        assert_eq!(PalaverError::not_found("gone").kind, ErrorKind::NotFound);
        assert_eq!(
            PalaverError::tool_not_found("calc").message,
            "tool 'calc' not found"
        );
        assert_eq!(
            PalaverError::ambiguous_selection("?").kind,
            ErrorKind::AmbiguousSelection
        );
    }

    #[test]
    fn operation_context_appears_in_display() {
        let err = PalaverError::timeout("60s elapsed").with_operation("elicit");
        let rendered = err.to_string();
        assert!(rendered.contains("elicit"));
        assert!(rendered.contains("60s elapsed"));
    }

    #[test]
    fn recoverable_classification() {
        assert!(PalaverError::sampling_unavailable("no model").is_recoverable());
        assert!(!PalaverError::external_service("http 502").is_recoverable());
        assert!(!PalaverError::internal("broken").is_recoverable());
    }

    #[test]
    fn serializes_kind_as_snake_case() {
        let json = serde_json::to_value(PalaverError::sampling_unavailable("x")).unwrap();
        assert_eq!(json["kind"], "sampling_unavailable");
    }
}
