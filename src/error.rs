//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Errors are scoped to where they can be recovered:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`ValidationError`] | session save gate | user edits the template |
//! | [`EncodingError`] | code generators | renderer draws a placeholder |
//! | [`FieldError`] | field model / session CRUD | caller fixes the request |
//! | [`PersistenceError`] | template store | passed through untouched |

use thiserror::Error;

use crate::codes::Symbology;

/// Main error type for the etiqueta CLI and other top-level callers.
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Template failed the save gate
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Barcode or QR symbol could not be produced
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Invalid field operation
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Template store failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Image encoding error (PNG export of a code image)
    #[error("Image error: {0}")]
    Image(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The template cannot be saved.
///
/// `reasons` is never empty and keeps the order in which checks ran.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template is not valid: {}", .reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

/// A symbol format rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot encode {input:?} as {symbology}: {reason}")]
pub struct EncodingError {
    pub symbology: Symbology,
    pub input: String,
    pub reason: String,
}

impl EncodingError {
    pub(crate) fn new(
        symbology: Symbology,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            symbology,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Field model and field CRUD errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("no field with id {0:?}")]
    NotFound(String),

    #[error("field id {0:?} is already used in this template")]
    DuplicateId(String),

    /// A payload (or payload patch) does not belong to the field's type.
    #[error("{payload} payload does not fit a {field_type} field")]
    PayloadMismatch {
        field_type: &'static str,
        payload: &'static str,
    },

    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },

    /// Malformed field on the persistence wire format.
    #[error("field {id:?}: {reason}")]
    Wire { id: String, reason: String },
}

/// Errors reported by a [`TemplateStore`](crate::store::TemplateStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("template {0:?} not found")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Why [`DesignerSession::save`](crate::session::DesignerSession::save) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
