// ============================================================================
// Registry Core - User Service
// File: crates/registry-core/src/services/user_service.rs
// ============================================================================
//! Registration/update engine
//!
//! Owns the conflict-resolution rules: live-record uniqueness, revival of
//! soft-deleted records on a matching email, idempotent-resubmission
//! detection, and sparse updates that re-validate only touched fields.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use registry_shared::constants::{
    ADDRESS_MAX_LEN, ADDRESS_MIN_LEN, MIN_AGE_YEARS, NAME_MAX_LEN, NAME_MIN_LEN, PLACE_MAX_LEN,
    PLACE_MIN_LEN,
};
use registry_shared::pii;

use crate::domain::{NewUser, User, UserUpdate};
use crate::error::{ConflictField, DomainError, FieldError};
use crate::repositories::UserRepository;
use crate::validators;

pub struct UserService<R: UserRepository> {
    repo: Arc<R>,
    log_hash_secret: String,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: Arc<R>, log_hash_secret: String) -> Self {
        Self {
            repo,
            log_hash_secret,
        }
    }

    fn digest(&self, value: &str) -> String {
        pii::log_digest(&self.log_hash_secret, value)
    }

    /// Create a user, or replay a previous keyed submission, or revive a
    /// soft-deleted record that holds the candidate email.
    ///
    /// A supplied `idempotency_key` becomes the stored `version` of the new
    /// record; a retry with the same key finds that record and returns it
    /// without inserting again.
    pub async fn create_user(
        &self,
        candidate: NewUser,
        idempotency_key: Option<String>,
    ) -> Result<User, DomainError> {
        let candidate = candidate.normalized();
        validate_new_user(&candidate)?;

        if let Some(key) = idempotency_key.as_deref() {
            if let Some(existing) = self.repo.find_live_by_version(key).await? {
                info!(
                    "Duplicate submission for subject {}, returning existing record",
                    self.digest(&existing.email)
                );
                return Ok(existing);
            }
        }
        let version = idempotency_key.unwrap_or_else(|| Uuid::new_v4().to_string());

        if self.repo.email_in_use(&candidate.email, None).await? {
            warn!(
                "Create rejected for subject {}: email in use",
                self.digest(&candidate.email)
            );
            return Err(DomainError::Conflict(ConflictField::Email));
        }

        if let Some(deleted) = self.repo.find_deleted_by_email(&candidate.email).await? {
            return self.revive(deleted, candidate, version).await;
        }

        self.check_id_conflicts(&candidate, None).await?;

        let user = self.repo.insert(&candidate, &version).await?;
        info!(
            "User {} created for subject {}",
            user.id,
            self.digest(&user.email)
        );
        Ok(user)
    }

    /// Bring a soft-deleted record back to life under the candidate's field
    /// values. The record keeps its id; deletion markers are cleared and the
    /// uniqueness checks exclude the record itself.
    async fn revive(
        &self,
        mut user: User,
        candidate: NewUser,
        version: String,
    ) -> Result<User, DomainError> {
        self.check_id_conflicts(&candidate, Some(user.id)).await?;

        user.name = candidate.name;
        user.email = candidate.email;
        user.primary_mobile = candidate.primary_mobile;
        user.secondary_mobile = candidate.secondary_mobile;
        user.national_id = candidate.national_id;
        user.tax_id = candidate.tax_id;
        user.date_of_birth = candidate.date_of_birth;
        user.place_of_birth = candidate.place_of_birth;
        user.current_address = candidate.current_address;
        user.permanent_address = candidate.permanent_address;
        user.is_deleted = false;
        user.deleted_at = None;
        user.deleted_by = None;
        user.is_active = true;
        user.version = version;

        let user = self.repo.update(&user).await?;
        info!(
            "User {} revived for subject {}",
            user.id,
            self.digest(&user.email)
        );
        Ok(user)
    }

    /// Uniqueness pre-checks among live records, in fixed field order:
    /// mobile, then national ID, then tax ID (email is checked by callers
    /// before this point).
    async fn check_id_conflicts(
        &self,
        candidate: &NewUser,
        exclude: Option<Uuid>,
    ) -> Result<(), DomainError> {
        if self
            .repo
            .mobile_in_use(&candidate.primary_mobile, exclude)
            .await?
        {
            return Err(DomainError::Conflict(ConflictField::Mobile));
        }
        if self
            .repo
            .national_id_in_use(&candidate.national_id, exclude)
            .await?
        {
            return Err(DomainError::Conflict(ConflictField::NationalId));
        }
        if self.repo.tax_id_in_use(&candidate.tax_id, exclude).await? {
            return Err(DomainError::Conflict(ConflictField::TaxId));
        }
        Ok(())
    }

    /// Live record by id.
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or(DomainError::NotFound(id))
    }

    /// Sparse update: only supplied fields are validated and applied. An
    /// empty update returns the record unchanged without a version bump.
    pub async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User, DomainError> {
        let mut user = self.get_user(id).await?;

        if update.is_empty() {
            return Ok(user);
        }
        validate_update(&update)?;

        if let Some(email) = &update.email {
            if *email != user.email && self.repo.email_in_use(email, Some(id)).await? {
                warn!(
                    "Update rejected for user {}: email in use by another record",
                    id
                );
                return Err(DomainError::Conflict(ConflictField::Email));
            }
        }
        if let Some(mobile) = &update.primary_mobile {
            if *mobile != user.primary_mobile && self.repo.mobile_in_use(mobile, Some(id)).await? {
                return Err(DomainError::Conflict(ConflictField::Mobile));
            }
        }

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(mobile) = update.primary_mobile {
            user.primary_mobile = mobile;
        }
        if let Some(mobile) = update.secondary_mobile {
            user.secondary_mobile = Some(mobile);
        }
        if let Some(address) = update.current_address {
            user.current_address = address;
        }
        if let Some(address) = update.permanent_address {
            user.permanent_address = address;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.version = Uuid::new_v4().to_string();

        let user = self.repo.update(&user).await?;
        info!("User {} updated", user.id);
        Ok(user)
    }

    /// Mark a live record deleted and return the post-delete snapshot. The
    /// record becomes invisible to lookups but its row remains in storage.
    pub async fn soft_delete_user(&self, id: Uuid) -> Result<User, DomainError> {
        let mut user = self.get_user(id).await?;

        user.is_deleted = true;
        user.deleted_at = Some(Utc::now());
        user.is_active = false;
        user.version = Uuid::new_v4().to_string();

        let user = self.repo.update(&user).await?;
        info!("User {} soft-deleted", user.id);
        Ok(user)
    }
}

fn check_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: u64,
    max: u64,
    reason: &str,
) {
    let len = value.chars().count() as u64;
    if len < min || len > max {
        errors.push(FieldError::new(field, reason));
    }
}

fn validate_new_user(candidate: &NewUser) -> Result<(), DomainError> {
    let mut errors = Vec::new();

    check_len(
        &mut errors,
        "name",
        &candidate.name,
        NAME_MIN_LEN,
        NAME_MAX_LEN,
        "Name must be between 2 and 255 characters",
    );
    if !validators::is_valid_email(&candidate.email) {
        errors.push(FieldError::new("email", "Invalid email format"));
    }
    if !validators::is_valid_mobile(&candidate.primary_mobile) {
        errors.push(FieldError::new(
            "primary_mobile",
            "Invalid mobile number format",
        ));
    }
    if let Some(mobile) = &candidate.secondary_mobile {
        if !validators::is_valid_mobile(mobile) {
            errors.push(FieldError::new(
                "secondary_mobile",
                "Invalid mobile number format",
            ));
        }
    }
    if !validators::is_valid_national_id(&candidate.national_id) {
        errors.push(FieldError::new("national_id", "Invalid national ID number"));
    }
    if !validators::is_valid_tax_id(&candidate.tax_id) {
        errors.push(FieldError::new("tax_id", "Invalid tax ID format"));
    }

    let today = Utc::now().date_naive();
    if candidate.date_of_birth > today {
        errors.push(FieldError::new(
            "date_of_birth",
            "Date of birth cannot be in the future",
        ));
    } else if !validators::meets_min_age(candidate.date_of_birth, today, MIN_AGE_YEARS) {
        errors.push(FieldError::new(
            "date_of_birth",
            "User must be at least 18 years old",
        ));
    }

    check_len(
        &mut errors,
        "place_of_birth",
        &candidate.place_of_birth,
        PLACE_MIN_LEN,
        PLACE_MAX_LEN,
        "Place of birth must be between 2 and 255 characters",
    );
    check_len(
        &mut errors,
        "current_address",
        &candidate.current_address,
        ADDRESS_MIN_LEN,
        ADDRESS_MAX_LEN,
        "Address must be between 10 and 1000 characters",
    );
    check_len(
        &mut errors,
        "permanent_address",
        &candidate.permanent_address,
        ADDRESS_MIN_LEN,
        ADDRESS_MAX_LEN,
        "Address must be between 10 and 1000 characters",
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors))
    }
}

fn validate_update(update: &UserUpdate) -> Result<(), DomainError> {
    let mut errors = Vec::new();

    if let Some(name) = &update.name {
        check_len(
            &mut errors,
            "name",
            name,
            NAME_MIN_LEN,
            NAME_MAX_LEN,
            "Name must be between 2 and 255 characters",
        );
    }
    if let Some(email) = &update.email {
        if !validators::is_valid_email(email) {
            errors.push(FieldError::new("email", "Invalid email format"));
        }
    }
    if let Some(mobile) = &update.primary_mobile {
        if !validators::is_valid_mobile(mobile) {
            errors.push(FieldError::new(
                "primary_mobile",
                "Invalid mobile number format",
            ));
        }
    }
    if let Some(mobile) = &update.secondary_mobile {
        if !validators::is_valid_mobile(mobile) {
            errors.push(FieldError::new(
                "secondary_mobile",
                "Invalid mobile number format",
            ));
        }
    }
    if let Some(address) = &update.current_address {
        check_len(
            &mut errors,
            "current_address",
            address,
            ADDRESS_MIN_LEN,
            ADDRESS_MAX_LEN,
            "Address must be between 10 and 1000 characters",
        );
    }
    if let Some(address) = &update.permanent_address {
        check_len(
            &mut errors,
            "permanent_address",
            address,
            ADDRESS_MIN_LEN,
            ADDRESS_MAX_LEN,
            "Address must be between 10 and 1000 characters",
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::user_repository::MockUserRepository;
    use chrono::NaiveDate;

    fn candidate() -> NewUser {
        NewUser {
            name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            primary_mobile: "9876543210".into(),
            secondary_mobile: Some("8765432109".into()),
            national_id: "123456789012".into(),
            tax_id: "ABCDE1234F".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            place_of_birth: "Mumbai".into(),
            current_address: "123 Main St, Mumbai, Maharashtra, India".into(),
            permanent_address: "456 Oak St, Mumbai, Maharashtra, India".into(),
        }
    }

    fn persisted(candidate: &NewUser, version: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            primary_mobile: candidate.primary_mobile.clone(),
            secondary_mobile: candidate.secondary_mobile.clone(),
            national_id: candidate.national_id.clone(),
            tax_id: candidate.tax_id.clone(),
            date_of_birth: candidate.date_of_birth,
            place_of_birth: candidate.place_of_birth.clone(),
            current_address: candidate.current_address.clone(),
            permanent_address: candidate.permanent_address.clone(),
            created_at: Utc::now(),
            updated_at: None,
            created_by: None,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
            version: version.into(),
            is_active: true,
            email_verified: false,
            mobile_verified: false,
            last_login_at: None,
        }
    }

    /// The version token doubles as the idempotency key: a keyed replay is
    /// answered from the version lookup alone and never reaches the insert
    /// path. A strict mock enforces "never" here.
    #[tokio::test]
    async fn keyed_replay_never_inserts() {
        let mut repo = MockUserRepository::new();
        let existing = persisted(&candidate(), "client-key-1");
        let found = existing.clone();
        repo.expect_find_live_by_version()
            .withf(|v| v == "client-key-1")
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let service = UserService::new(Arc::new(repo), "test-secret".into());
        let replayed = service
            .create_user(candidate(), Some("client-key-1".into()))
            .await
            .unwrap();

        assert_eq!(replayed.id, existing.id);
        assert_eq!(replayed.version, "client-key-1");
    }

    #[tokio::test]
    async fn validation_failures_are_collected_before_any_lookup() {
        let repo = MockUserRepository::new();
        let service = UserService::new(Arc::new(repo), "test-secret".into());

        let mut bad = candidate();
        bad.primary_mobile = "1234567890".into();
        bad.tax_id = "NOPE".into();

        let err = service.create_user(bad, None).await.unwrap_err();
        match err {
            DomainError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["primary_mobile", "tax_id"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repository_faults_propagate_from_lookup() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Err(DomainError::Database("connection reset".into())));

        let service = UserService::new(Arc::new(repo), "test-secret".into());
        let err = service.get_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::Database(_)));
    }
}
