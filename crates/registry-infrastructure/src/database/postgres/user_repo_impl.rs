//! PostgreSQL user repository.
//!
//! Uniqueness among live records is enforced twice: the engine's pre-checks
//! go through the `*_in_use` queries here, and the partial unique indexes are
//! the last line of defense when two requests race past the pre-check. A
//! violation raised at commit is remapped to the conflicting field by
//! constraint name.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

use registry_core::domain::{NewUser, User};
use registry_core::error::{ConflictField, DomainError};
use registry_core::repositories::UserRepository;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "\
    id, name, email, primary_mobile, secondary_mobile, \
    national_id, tax_id, date_of_birth, place_of_birth, \
    current_address, permanent_address, \
    created_at, updated_at, created_by, updated_by, \
    is_deleted, deleted_at, deleted_by, version, \
    is_active, email_verified, mobile_verified, last_login_at";

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
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
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub version: String,
    pub is_active: bool,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            primary_mobile: row.primary_mobile,
            secondary_mobile: row.secondary_mobile,
            national_id: row.national_id,
            tax_id: row.tax_id,
            date_of_birth: row.date_of_birth,
            place_of_birth: row.place_of_birth,
            current_address: row.current_address,
            permanent_address: row.permanent_address,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
            version: row.version,
            is_active: row.is_active,
            email_verified: row.email_verified,
            mobile_verified: row.mobile_verified,
            last_login_at: row.last_login_at,
        }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("Database error {}: {}", context, e);
    DomainError::Database(e.to_string())
}

/// Map a commit-time unique violation to the conflicting field. Anything
/// else stays a database fault.
fn map_write_error(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            match db.constraint() {
                Some("uq_users_email") => {
                    return DomainError::Conflict(ConflictField::Email);
                }
                Some("uq_users_primary_mobile") => {
                    return DomainError::Conflict(ConflictField::Mobile);
                }
                Some("uq_users_national_id") => {
                    return DomainError::Conflict(ConflictField::NationalId);
                }
                Some("uq_users_tax_id") => {
                    return DomainError::Conflict(ConflictField::TaxId);
                }
                _ => {}
            }
        }
    }
    db_error("writing user", e)
}

/// LIKE pattern for a substring search, with the wildcard characters in the
/// query escaped.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl PgUserRepository {
    async fn value_in_use(
        &self,
        column: &str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        let sql = format!(
            "SELECT EXISTS(
                SELECT 1 FROM users
                WHERE {column} = $1 AND NOT is_deleted
                  AND ($2::uuid IS NULL OR id <> $2)
            )"
        );
        sqlx::query_scalar::<_, bool>(&sql)
            .bind(value)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("checking uniqueness", e))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND NOT is_deleted");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding user by id", e))?;
        Ok(row.map(Into::into))
    }

    async fn find_live_by_version(&self, version: &str) -> Result<Option<User>, DomainError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE version = $1 AND NOT is_deleted");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(version)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding user by version", e))?;
        Ok(row.map(Into::into))
    }

    async fn find_deleted_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE email = $1 AND is_deleted
             ORDER BY deleted_at DESC
             LIMIT 1"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("finding deleted user by email", e))?;
        Ok(row.map(Into::into))
    }

    async fn email_in_use(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        self.value_in_use("email", email, exclude).await
    }

    async fn mobile_in_use(
        &self,
        mobile: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        self.value_in_use("primary_mobile", mobile, exclude).await
    }

    async fn national_id_in_use(
        &self,
        national_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        self.value_in_use("national_id", national_id, exclude).await
    }

    async fn tax_id_in_use(
        &self,
        tax_id: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DomainError> {
        self.value_in_use("tax_id", tax_id, exclude).await
    }

    async fn insert(&self, user: &NewUser, version: &str) -> Result<User, DomainError> {
        let sql = format!(
            "INSERT INTO users (
                name, email, primary_mobile, secondary_mobile,
                national_id, tax_id, date_of_birth, place_of_birth,
                current_address, permanent_address, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.primary_mobile)
            .bind(&user.secondary_mobile)
            .bind(&user.national_id)
            .bind(&user.tax_id)
            .bind(user.date_of_birth)
            .bind(&user.place_of_birth)
            .bind(&user.current_address)
            .bind(&user.permanent_address)
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let sql = format!(
            "UPDATE users
             SET
                name = $2,
                email = $3,
                primary_mobile = $4,
                secondary_mobile = $5,
                national_id = $6,
                tax_id = $7,
                date_of_birth = $8,
                place_of_birth = $9,
                current_address = $10,
                permanent_address = $11,
                is_deleted = $12,
                deleted_at = $13,
                deleted_by = $14,
                version = $15,
                is_active = $16,
                email_verified = $17,
                mobile_verified = $18,
                last_login_at = $19,
                updated_by = $20,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.primary_mobile)
            .bind(&user.secondary_mobile)
            .bind(&user.national_id)
            .bind(&user.tax_id)
            .bind(user.date_of_birth)
            .bind(&user.place_of_birth)
            .bind(&user.current_address)
            .bind(&user.permanent_address)
            .bind(user.is_deleted)
            .bind(user.deleted_at)
            .bind(user.deleted_by)
            .bind(&user.version)
            .bind(user.is_active)
            .bind(user.email_verified)
            .bind(user.mobile_verified)
            .bind(user.last_login_at)
            .bind(user.updated_by)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn count_live(&self) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE NOT is_deleted")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("counting users", e))
    }

    async fn list_page(&self, offset: i64, limit: i64) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE NOT is_deleted
             ORDER BY created_at DESC
             OFFSET $1 LIMIT $2"
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("listing users", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_search(&self, query: &str) -> Result<i64, DomainError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users
             WHERE NOT is_deleted AND (name LIKE $1 OR email LIKE $1)",
        )
        .bind(like_pattern(query))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("counting search results", e))
    }

    async fn search_page(
        &self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE NOT is_deleted AND (name LIKE $1 OR email LIKE $1)
             ORDER BY created_at DESC
             OFFSET $2 LIMIT $3"
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(like_pattern(query))
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("searching users", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
