//! Error types for decoding

use thiserror::Error;

use crate::extractors::ScalarKind;

/// Boxed failure returned by user-supplied constructors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort a decode call
///
/// Leaf-level misses (no match, absent attribute, malformed text under the
/// lenient policy) never show up here; the field keeps its default instead.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The schema was built without a way to construct the target
    #[error("No-args constructor for type `{type_name}` does not exist.")]
    MissingConstructor { type_name: String },

    /// The constructor ran and failed
    #[error("Failed to construct `{type_name}`: {source}")]
    Construction {
        type_name: String,
        #[source]
        source: BoxError,
    },

    /// A declared field kind matches no extractor
    #[error("Type `{0}` is not supported.")]
    UnsupportedType(String),

    /// A root or field query is not valid CSS
    #[error("Invalid selector `{query}`: {reason}")]
    InvalidSelector { query: String, reason: String },

    /// Malformed leaf text under the strict coercion policy
    #[error("Cannot read {raw:?} as {kind} for field `{field}`")]
    Coercion {
        field: String,
        kind: ScalarKind,
        raw: String,
    },

    /// Nested decoding went deeper than the configured limit
    #[error("Nesting depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },

    /// A runtime declaration is structurally incomplete
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Decoder configuration rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DecodeError {
    pub(crate) fn invalid_selector(query: &str, reason: impl std::fmt::Display) -> Self {
        DecodeError::InvalidSelector {
            query: query.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by bad leaf data rather than configuration
    pub fn is_data_error(&self) -> bool {
        matches!(self, DecodeError::Coercion { .. })
    }
}
