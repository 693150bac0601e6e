//! Error types for the `layer-models` crate.
//!
//! All fallible constructors and `FromStr` implementations in this crate
//! return variants of [`ModelError`].

/// Errors produced when constructing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An identifier was neither a UUID nor a `layer:///` URL of the expected kind.
    #[error("invalid {kind} id \"{value}\"")]
    InvalidIdentifier {
        /// Resource kind (`conversation`, `message`, ...).
        kind: &'static str,
        /// The value that failed validation.
        value: String,
    },

    /// A required field was missing or empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },
}
