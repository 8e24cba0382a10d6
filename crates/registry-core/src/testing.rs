//! In-memory repository for tests and local demos.
//!
//! Backed by a mutex-guarded vector in insertion order, which matches the
//! store's `created_at DESC` listing contract since timestamps are assigned
//! monotonically at insert.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{NewUser, User};
use crate::error::DomainError;
use crate::repositories::UserRepository;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, deleted ones included. Lets tests assert that soft
    /// deletion keeps the row in storage.
    pub fn snapshot(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn live_matches(&self, predicate: impl Fn(&User) -> bool, exclude: Option<Uuid>) -> bool {
        self.users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_live())
            .filter(|u| exclude != Some(u.id))
            .any(|u| predicate(u))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == *id && u.is_live())
            .cloned())
    }

    async fn find_live_by_version(&self, version: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.version == version && u.is_live())
            .cloned())
    }

    async fn find_deleted_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_deleted && u.email == email)
            .max_by_key(|u| u.deleted_at)
            .cloned())
    }

    async fn email_in_use(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        Ok(self.live_matches(|u| u.email == email, exclude))
    }

    async fn mobile_in_use(
        &self,
        mobile: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        Ok(self.live_matches(|u| u.primary_mobile == mobile, exclude))
    }

    async fn national_id_in_use(
        &self,
        national_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        Ok(self.live_matches(|u| u.national_id == national_id, exclude))
    }

    async fn tax_id_in_use(
        &self,
        tax_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        Ok(self.live_matches(|u| u.tax_id == tax_id, exclude))
    }

    async fn insert(&self, user: &NewUser, version: &str) -> Result<User, DomainError> {
        let record = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            primary_mobile: user.primary_mobile.clone(),
            secondary_mobile: user.secondary_mobile.clone(),
            national_id: user.national_id.clone(),
            tax_id: user.tax_id.clone(),
            date_of_birth: user.date_of_birth,
            place_of_birth: user.place_of_birth.clone(),
            current_address: user.current_address.clone(),
            permanent_address: user.permanent_address.clone(),
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            version: version.to_string(),
            is_active: true,
            email_verified: false,
            mobile_verified: false,
            last_login_at: None,
        };
        self.users.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(DomainError::NotFound(user.id))?;
        let mut updated = user.clone();
        updated.updated_at = Some(Utc::now());
        *slot = updated.clone();
        Ok(updated)
    }

    async fn count_live(&self) -> Result<i64, DomainError> {
        Ok(self.users.lock().unwrap().iter().filter(|u| u.is_live()).count() as i64)
    }

    async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|u| u.is_live())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_search(&self, query: &str) -> Result<i64, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_live() && (u.name.contains(query) || u.email.contains(query)))
            .count() as i64)
    }

    async fn search_page(
        &self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|u| u.is_live() && (u.name.contains(query) || u.email.contains(query)))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
