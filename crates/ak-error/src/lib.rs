// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for actionkit adapters.
//!
//! Every error carries an [`ErrorCode`] (a machine-readable, stable string
//! tag), a human-readable message, an optional cause chain, and arbitrary
//! key-value context. Adapters never translate errors raised by a toolset:
//! the same [`AkError`] travels from the toolset to the adapter's caller.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Convenience alias used across the workspace.
pub type AkResult<T> = Result<T, AkError>;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid or unmatched action/app/tag filters.
    Filter,
    /// Malformed JSON-Schema parameters.
    Schema,
    /// Model responses with an unexpected shape or depth.
    Response,
    /// Failures raised while executing an action.
    Execution,
    /// Configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Filter => "filter",
            Self::Schema => "schema",
            Self::Response => "response",
            Self::Execution => "execution",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Filter --
    /// The filter names an action, app, or tag the toolset does not know.
    FilterInvalid,
    /// The filter is well-formed but selects no actions.
    FilterNoMatch,

    // -- Schema --
    /// Tool parameters are not a usable JSON Schema object.
    SchemaInvalid,

    // -- Response --
    /// A model response has an unexpected structure.
    ResponseMalformed,
    /// A model response nests deeper than the configured cap.
    ResponseTooDeep,

    // -- Execution --
    /// The requested action is not registered.
    ActionNotFound,
    /// The entity may not execute the requested action.
    ActionPermissionDenied,
    /// The action ran and failed.
    ActionFailed,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FilterInvalid | Self::FilterNoMatch => ErrorCategory::Filter,

            Self::SchemaInvalid => ErrorCategory::Schema,

            Self::ResponseMalformed | Self::ResponseTooDeep => ErrorCategory::Response,

            Self::ActionNotFound | Self::ActionPermissionDenied | Self::ActionFailed => {
                ErrorCategory::Execution
            }

            Self::ConfigInvalid => ErrorCategory::Config,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"FILTER_NO_MATCH"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FilterInvalid => "FILTER_INVALID",
            Self::FilterNoMatch => "FILTER_NO_MATCH",
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::ResponseMalformed => "RESPONSE_MALFORMED",
            Self::ResponseTooDeep => "RESPONSE_TOO_DEEP",
            Self::ActionNotFound => "ACTION_NOT_FOUND",
            Self::ActionPermissionDenied => "ACTION_PERMISSION_DENIED",
            Self::ActionFailed => "ACTION_FAILED",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AkError
// ---------------------------------------------------------------------------

/// Unified actionkit error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use ak_error::{AkError, ErrorCode};
///
/// let err = AkError::new(ErrorCode::ActionFailed, "GitHub returned 502")
///     .with_context("action", "GITHUB_STAR_A_REPOSITORY")
///     .with_context("status", 502);
/// assert!(err.is_execution_error());
/// ```
pub struct AkError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl AkError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// `true` for invalid or unmatched tool filters.
    pub fn is_filter_error(&self) -> bool {
        self.category() == ErrorCategory::Filter
    }

    /// `true` for malformed JSON-Schema parameters.
    pub fn is_schema_error(&self) -> bool {
        self.category() == ErrorCategory::Schema
    }

    /// `true` for model responses the walker could not convert.
    pub fn is_malformed_response(&self) -> bool {
        self.category() == ErrorCategory::Response
    }

    /// `true` for failures raised by the action execution engine.
    pub fn is_execution_error(&self) -> bool {
        self.category() == ErrorCategory::Execution
    }
}

impl fmt::Debug for AkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("AkError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for AkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            // BTreeMap keeps this deterministic.
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for AkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of an [`AkError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AkErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&AkError> for AkErrorDto {
    fn from(err: &AkError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<AkErrorDto> for AkError {
    fn from(dto: AkErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    const ALL_CODES: &[ErrorCode] = &[
        ErrorCode::FilterInvalid,
        ErrorCode::FilterNoMatch,
        ErrorCode::SchemaInvalid,
        ErrorCode::ResponseMalformed,
        ErrorCode::ResponseTooDeep,
        ErrorCode::ActionNotFound,
        ErrorCode::ActionPermissionDenied,
        ErrorCode::ActionFailed,
        ErrorCode::ConfigInvalid,
        ErrorCode::Internal,
    ];

    #[test]
    fn basic_construction() {
        let err = AkError::new(ErrorCode::Internal, "boom");
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "boom");
        assert!(err.source.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn display_without_context() {
        let err = AkError::new(ErrorCode::ActionNotFound, "no such action");
        assert_eq!(err.to_string(), "[ACTION_NOT_FOUND] no such action");
    }

    #[test]
    fn display_with_context() {
        let err = AkError::new(ErrorCode::ResponseTooDeep, "too deep").with_context("max_depth", 64);
        let s = err.to_string();
        assert!(s.starts_with("[RESPONSE_TOO_DEEP] too deep"));
        assert!(s.contains("max_depth"));
        assert!(s.contains("64"));
    }

    #[test]
    fn debug_with_source() {
        let src = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err = AkError::new(ErrorCode::ConfigInvalid, "load failed").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("ConfigInvalid"));
        assert!(dbg.contains("file missing"));
    }

    #[test]
    fn codes_map_to_spec_categories() {
        assert_eq!(ErrorCode::FilterInvalid.category(), ErrorCategory::Filter);
        assert_eq!(ErrorCode::FilterNoMatch.category(), ErrorCategory::Filter);
        assert_eq!(ErrorCode::SchemaInvalid.category(), ErrorCategory::Schema);
        assert_eq!(ErrorCode::ResponseMalformed.category(), ErrorCategory::Response);
        assert_eq!(ErrorCode::ResponseTooDeep.category(), ErrorCategory::Response);
        assert_eq!(ErrorCode::ActionNotFound.category(), ErrorCategory::Execution);
        assert_eq!(
            ErrorCode::ActionPermissionDenied.category(),
            ErrorCategory::Execution
        );
        assert_eq!(ErrorCode::ActionFailed.category(), ErrorCategory::Execution);
        assert_eq!(ErrorCode::ConfigInvalid.category(), ErrorCategory::Config);
        assert_eq!(ErrorCode::Internal.category(), ErrorCategory::Internal);
    }

    #[test]
    fn predicates_follow_category() {
        assert!(AkError::new(ErrorCode::FilterNoMatch, "").is_filter_error());
        assert!(AkError::new(ErrorCode::SchemaInvalid, "").is_schema_error());
        assert!(AkError::new(ErrorCode::ResponseTooDeep, "").is_malformed_response());
        assert!(AkError::new(ErrorCode::ActionFailed, "").is_execution_error());
        assert!(!AkError::new(ErrorCode::Internal, "").is_execution_error());
    }

    #[test]
    fn builder_with_context_multiple_keys() {
        let err = AkError::new(ErrorCode::ActionFailed, "failed")
            .with_context("action", "SLACK_SEND_MESSAGE")
            .with_context("entity_id", "default")
            .with_context("status", 500);
        assert_eq!(err.context.len(), 3);
        assert_eq!(err.context["action"], serde_json::json!("SLACK_SEND_MESSAGE"));
        assert_eq!(err.context["status"], serde_json::json!(500));
    }

    #[test]
    fn std_error_source_chain() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = AkError::new(ErrorCode::ActionFailed, "downstream").with_source(inner);
        let src = std::error::Error::source(&err).unwrap();
        assert_eq!(src.to_string(), "not found");
    }

    #[test]
    fn error_code_serde_roundtrip() {
        let code = ErrorCode::ActionPermissionDenied;
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, r#""ACTION_PERMISSION_DENIED""#);
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }

    #[test]
    fn dto_keeps_source_message_only() {
        let src = io::Error::new(io::ErrorKind::BrokenPipe, "pipe broke");
        let err = AkError::new(ErrorCode::ActionFailed, "crash").with_source(src);
        let dto: AkErrorDto = (&err).into();
        assert_eq!(dto.source_message.as_deref(), Some("pipe broke"));

        let back: AkError = dto.into();
        assert_eq!(back.code, ErrorCode::ActionFailed);
        assert!(back.source.is_none());
    }

    #[test]
    fn all_codes_have_unique_as_str() {
        let mut seen = HashSet::new();
        for code in ALL_CODES {
            let s = code.as_str();
            assert!(seen.insert(s), "duplicate as_str value: {s}");
        }
    }

    #[test]
    fn all_codes_serialize_to_as_str() {
        for code in ALL_CODES {
            let json = serde_json::to_string(code).unwrap();
            assert_eq!(json, format!(r#""{}""#, code.as_str()), "mismatch for {code:?}");
        }
    }

    #[test]
    fn error_category_display() {
        assert_eq!(ErrorCategory::Filter.to_string(), "filter");
        assert_eq!(ErrorCategory::Execution.to_string(), "execution");
    }
}
