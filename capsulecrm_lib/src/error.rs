//! Error types for the library layer.

use thiserror::Error;

/// Errors produced by the library layer, wrapping transport errors and
/// adding the data-shape, lookup, and validation failures of the entity model.
#[derive(Error, Debug)]
pub enum CapsuleError {
    /// An error from the underlying API client, including non-2xx responses.
    #[error("API error: {0}")]
    Api(#[from] capsulecrm_api::Error),
    /// Remote data did not have the expected shape (bad date, unknown
    /// custom-field type, non-numeric id, missing required key).
    #[error("Format error: {0}")]
    Format(String),
    /// An optional field, tag, or custom field is not populated.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),
    /// A local precondition failed before or instead of a network call.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Required configuration is missing.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CapsuleError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::AttributeNotFound(name.to_string())
    }

    /// True for the recoverable "field not populated" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AttributeNotFound(_))
    }
}
