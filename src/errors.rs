//! Error types for compilation and result extraction
//!
//! Error codes:
//! - AGG_UNRESOLVABLE_FIELD (REJECT)
//! - AGG_UNSUPPORTED_PREDICATE (REJECT)
//! - AGG_UNSUPPORTED_LITERAL (REJECT)
//! - AGG_DUPLICATE_AGGREGATION (REJECT)
//! - AGG_NO_AGGREGATIONS (REJECT)
//! - AGG_NO_SUCH_AGGREGATION (REJECT)
//! - AGG_VALUE_COERCION (REJECT)
//! - AGG_DESERIALIZE (REJECT)
//! - AGG_ENGINE (ERROR)
//!
//! Everything except engine failures is a programming error in the request
//! and is raised immediately, never retried.

use std::fmt;

use thiserror::Error;

/// Result type for compilation and extraction
pub type AggResult<T> = Result<T, AggError>;

/// Severity levels for aggtree errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The request itself is malformed
    Reject,
    /// The collaborator failed
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UnresolvableField,
    UnsupportedPredicate,
    UnsupportedLiteral,
    DuplicateAggregation,
    NoAggregations,
    NoSuchAggregation,
    ValueCoercion,
    Deserialize,
    Engine,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnresolvableField => "AGG_UNRESOLVABLE_FIELD",
            ErrorCode::UnsupportedPredicate => "AGG_UNSUPPORTED_PREDICATE",
            ErrorCode::UnsupportedLiteral => "AGG_UNSUPPORTED_LITERAL",
            ErrorCode::DuplicateAggregation => "AGG_DUPLICATE_AGGREGATION",
            ErrorCode::NoAggregations => "AGG_NO_AGGREGATIONS",
            ErrorCode::NoSuchAggregation => "AGG_NO_SUCH_AGGREGATION",
            ErrorCode::ValueCoercion => "AGG_VALUE_COERCION",
            ErrorCode::Deserialize => "AGG_DESERIALIZE",
            ErrorCode::Engine => "AGG_ENGINE",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::Engine => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compilation and extraction errors
#[derive(Debug, Error)]
pub enum AggError {
    /// Expression shape cannot be mapped to a field name
    #[error("Unresolvable field expression: {0}")]
    UnresolvableField(String),

    /// Predicate shape has no query lowering
    #[error("Unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// Literal kind cannot appear in this position
    #[error("Unsupported literal type '{kind}' in {context}")]
    UnsupportedLiteralType { kind: &'static str, context: String },

    /// Two aggregations at one level share a name
    #[error("Duplicate aggregation '{0}' at the same level")]
    DuplicateAggregation(String),

    /// The result tree carries no aggregations at all
    #[error("Result contains no aggregations (looking for '{0}')")]
    NoAggregations(String),

    /// Named lookup miss
    #[error("no aggregation named '{name}'; present aggregations: {}", present.join(", "))]
    NoSuchAggregation { name: String, present: Vec<String> },

    /// Stored value cannot be converted to the requested type
    #[error("Cannot convert {found} to {target} (aggregation '{name}')")]
    ValueCoercion {
        name: String,
        found: String,
        target: &'static str,
    },

    /// Returned document source does not match the requested type
    #[error("Cannot deserialize hit source: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The search engine collaborator failed
    #[error("Engine error: {0}")]
    Engine(String),
}

impl AggError {
    /// Create a value coercion error
    pub fn coercion(name: impl Into<String>, found: impl fmt::Display, target: &'static str) -> Self {
        AggError::ValueCoercion {
            name: name.into(),
            found: found.to_string(),
            target,
        }
    }

    /// Create an unsupported literal error
    pub fn unsupported_literal(kind: &'static str, context: impl Into<String>) -> Self {
        AggError::UnsupportedLiteralType {
            kind,
            context: context.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            AggError::UnresolvableField(_) => ErrorCode::UnresolvableField,
            AggError::UnsupportedPredicate(_) => ErrorCode::UnsupportedPredicate,
            AggError::UnsupportedLiteralType { .. } => ErrorCode::UnsupportedLiteral,
            AggError::DuplicateAggregation(_) => ErrorCode::DuplicateAggregation,
            AggError::NoAggregations(_) => ErrorCode::NoAggregations,
            AggError::NoSuchAggregation { .. } => ErrorCode::NoSuchAggregation,
            AggError::ValueCoercion { .. } => ErrorCode::ValueCoercion,
            AggError::Deserialize(_) => ErrorCode::Deserialize,
            AggError::Engine(_) => ErrorCode::Engine,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Only collaborator failures may succeed on a second attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, AggError::Engine(_))
    }
}
