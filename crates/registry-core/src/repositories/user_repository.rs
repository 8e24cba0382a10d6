//! User repository trait (port)
//!
//! Lookups that say "live" filter out soft-deleted rows; the `*_in_use`
//! checks only consider live rows and can exclude one record id, which is how
//! updates and revivals avoid colliding with themselves. Implementations must
//! remap backend unique-constraint violations to
//! [`DomainError::Conflict`](crate::error::DomainError) with the failing
//! field, never surface them as generic database faults.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewUser, User};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Live record by id.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;

    /// Live record whose version token equals the given value. Used for
    /// idempotent-replay detection on create.
    async fn find_live_by_version(&self, version: &str) -> Result<Option<User>, DomainError>;

    /// Most recently deleted soft-deleted record with this email, if any.
    async fn find_deleted_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn email_in_use(&self, email: &str, exclude: Option<Uuid>)
        -> Result<bool, DomainError>;
    async fn mobile_in_use(
        &self,
        mobile: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError>;
    async fn national_id_in_use(
        &self,
        national_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError>;
    async fn tax_id_in_use(
        &self,
        tax_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError>;

    /// Persist a new record. Id and timestamps are store-assigned.
    async fn insert(&self, user: &NewUser, version: &str) -> Result<User, DomainError>;

    /// Persist a full row by id (update, revival, soft delete). The store
    /// stamps `updated_at`.
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    async fn count_live(&self) -> Result<i64, DomainError>;
    async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<User>, DomainError>;

    /// Count / fetch live records whose name or email contains the query.
    async fn count_search(&self, query: &str) -> Result<i64, DomainError>;
    async fn search_page(
        &self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, DomainError>;
}
