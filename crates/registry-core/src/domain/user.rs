//! User domain entity

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sole persisted entity. Email, primary mobile, national ID, and tax ID
/// are each unique among live (non-deleted) records; a soft-deleted record
/// keeps every historical value until it is revived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    pub name: String,
    pub email: String,
    pub primary_mobile: String,
    pub secondary_mobile: Option<String>,

    pub national_id: String,
    pub tax_id: String,

    pub date_of_birth: NaiveDate,
    pub place_of_birth: String,

    pub current_address: String,
    pub permanent_address: String,

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,

    // Soft delete
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,

    /// Optimistic-lock token, regenerated on every mutation. Also carries the
    /// client idempotency key when a create supplied one.
    pub version: String,

    pub is_active: bool,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }
}

/// Candidate fields for a create request. Id, timestamps, and flags are
/// assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub primary_mobile: String,
    pub secondary_mobile: Option<String>,
    pub national_id: String,
    pub tax_id: String,
    pub date_of_birth: NaiveDate,
    pub place_of_birth: String,
    pub current_address: String,
    pub permanent_address: String,
}

impl NewUser {
    /// Tax IDs are stored and compared upper-cased.
    pub fn normalized(mut self) -> Self {
        self.tax_id = self.tax_id.to_ascii_uppercase();
        self
    }
}

/// Sparse update: only supplied fields are mutated. National ID, tax ID,
/// date of birth, and place of birth are immutable through updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub primary_mobile: Option<String>,
    pub secondary_mobile: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.primary_mobile.is_none()
            && self.secondary_mobile.is_none()
            && self.current_address.is_none()
            && self.permanent_address.is_none()
            && self.is_active.is_none()
    }
}
