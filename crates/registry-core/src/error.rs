//! Domain errors

use thiserror::Error;
use uuid::Uuid;

/// A single failed field check, reported back to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Which live-record uniqueness constraint was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Email,
    Mobile,
    NationalId,
    TaxId,
}

impl ConflictField {
    /// Stable wire name used in API error payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictField::Email => "email",
            ConflictField::Mobile => "primary_mobile",
            ConflictField::NationalId => "national_id",
            ConflictField::TaxId => "tax_id",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ConflictField::Email => "Email already registered",
            ConflictField::Mobile => "Mobile number already registered",
            ConflictField::NationalId => "National ID already registered",
            ConflictField::TaxId => "Tax ID already registered",
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("validation failed on {0:?}")]
    Validation(Vec<FieldError>),

    #[error("{}", .0.message())]
    Conflict(ConflictField),

    #[error("User not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),
}
