//! Error types for schema construction and record coding.

use std::io;

use thiserror::Error;

/// Errors produced by schema validation, encoding and decoding.
///
/// Every error is local to the call that produced it; a failed call never
/// returns a partial record or instance.
#[derive(Debug, Error)]
pub enum CoderError {
    /// The schema definition is invalid (colliding wire fields, negative
    /// dimensions or sizes).
    #[error("schema error: {0}")]
    Schema(String),

    /// Wire bytes do not parse, or a parsed field disagrees with its
    /// feature's dtype or length contract.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A feature that is not VarLen was absent from the instance.
    #[error("missing feature: {feature}")]
    MissingFeature {
        /// Logical feature name.
        feature: String,
    },

    /// The instance value violates the declared shape contract.
    #[error("feature {feature} has invalid shape: {message}")]
    FeatureShape {
        /// Logical feature name.
        feature: String,
        /// What was wrong.
        message: String,
    },

    /// The instance value holds scalars that cannot be coerced to the
    /// feature's dtype.
    #[error("feature {feature}: expected {expected} values, got {actual}")]
    InvalidValue {
        /// Logical feature name.
        feature: String,
        /// Declared dtype.
        expected: &'static str,
        /// Kind of the offending value.
        actual: &'static str,
    },

    /// A codec could not be serialized for relocation, or a relocation blob
    /// could not be read back.
    #[error("codec serialization error: {0}")]
    Serialization(String),

    /// Caller misuse outside the record path.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An I/O error while reading or writing asset files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoderError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRecord(message.into())
    }

    pub(crate) fn shape(feature: &str, message: impl Into<String>) -> Self {
        Self::FeatureShape {
            feature: feature.to_string(),
            message: message.into(),
        }
    }
}

impl From<prost::DecodeError> for CoderError {
    fn from(err: prost::DecodeError) -> Self {
        Self::MalformedRecord(err.to_string())
    }
}

/// Result type for coder operations.
pub type Result<T> = std::result::Result<T, CoderError>;
