// ============================================================================
// Registry API - User Handlers
// File: crates/registry-api/src/handlers/users.rs
// ============================================================================
//! User HTTP handlers (create, read, update, delete, list, search)
//!
//! Request DTOs reject malformed payloads with 422 before the engine runs,
//! mirroring the engine's own field checks; the engine remains the authority
//! for age, conflict, and revival policy.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use registry_core::domain::{NewUser, User, UserUpdate};
use registry_core::repositories::UserRepository;
use registry_core::validators::{EMAIL_RE, MOBILE_RE};
use registry_shared::config::PaginationSettings;
use registry_shared::constants::MIN_SEARCH_QUERY_LEN;
use registry_shared::types::{Page, PageRequest};

use crate::response::{
    domain_error_response, not_found_response, validation_response, ApiResponse, ErrorResponse,
    FieldIssue,
};
use crate::state::AppState;

/// Create request payload: full candidate record plus an optional
/// client-generated idempotency key.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: String,

    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: String,

    #[validate(regex(path = *MOBILE_RE, message = "Invalid mobile number format"))]
    pub primary_mobile: String,

    #[validate(regex(path = *MOBILE_RE, message = "Invalid mobile number format"))]
    pub secondary_mobile: Option<String>,

    #[validate(length(equal = 12, message = "Invalid national ID number"))]
    pub national_id: String,

    // Case is normalized by the engine; only the length is checked here.
    #[validate(length(equal = 10, message = "Invalid tax ID format"))]
    pub tax_id: String,

    pub date_of_birth: NaiveDate,

    #[validate(length(
        min = 2,
        max = 255,
        message = "Place of birth must be between 2 and 255 characters"
    ))]
    pub place_of_birth: String,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Address must be between 10 and 1000 characters"
    ))]
    pub current_address: String,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Address must be between 10 and 1000 characters"
    ))]
    pub permanent_address: String,

    // Becomes the stored version token, which caps its length.
    #[validate(length(min = 1, max = 64, message = "Idempotency key must be 1 to 64 characters"))]
    pub idempotency_key: Option<String>,
}

impl CreateUserRequest {
    fn into_parts(self) -> (NewUser, Option<String>) {
        (
            NewUser {
                name: self.name,
                email: self.email,
                primary_mobile: self.primary_mobile,
                secondary_mobile: self.secondary_mobile,
                national_id: self.national_id,
                tax_id: self.tax_id,
                date_of_birth: self.date_of_birth,
                place_of_birth: self.place_of_birth,
                current_address: self.current_address,
                permanent_address: self.permanent_address,
            },
            self.idempotency_key,
        )
    }
}

/// Sparse update payload: every field independently optional. Government IDs
/// and birth data are not part of the update contract.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be between 2 and 255 characters"))]
    pub name: Option<String>,

    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(regex(path = *MOBILE_RE, message = "Invalid mobile number format"))]
    pub primary_mobile: Option<String>,

    #[validate(regex(path = *MOBILE_RE, message = "Invalid mobile number format"))]
    pub secondary_mobile: Option<String>,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Address must be between 10 and 1000 characters"
    ))]
    pub current_address: Option<String>,

    #[validate(length(
        min = 10,
        max = 1000,
        message = "Address must be between 10 and 1000 characters"
    ))]
    pub permanent_address: Option<String>,

    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        UserUpdate {
            name: req.name,
            email: req.email,
            primary_mobile: req.primary_mobile,
            secondary_mobile: req.secondary_mobile,
            current_address: req.current_address,
            permanent_address: req.permanent_address,
            is_active: req.is_active,
        }
    }
}

/// User DTO for responses
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub primary_mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_mobile: Option<String>,
    pub national_id: String,
    pub tax_id: String,
    pub date_of_birth: NaiveDate,
    pub place_of_birth: String,
    pub current_address: String,
    pub permanent_address: String,
    pub is_active: bool,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub version: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            primary_mobile: user.primary_mobile,
            secondary_mobile: user.secondary_mobile,
            national_id: user.national_id,
            tax_id: user.tax_id,
            date_of_birth: user.date_of_birth,
            place_of_birth: user.place_of_birth,
            current_address: user.current_address,
            permanent_address: user.permanent_address,
            is_active: user.is_active,
            is_deleted: user.is_deleted,
            deleted_at: user.deleted_at,
            email_verified: user.email_verified,
            mobile_verified: user.mobile_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
            version: user.version,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

fn request_validation_response(errors: ValidationErrors) -> ErrorResponse {
    let mut details: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(|e| FieldIssue {
                    field: field.clone(),
                    reason: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    validation_response(details)
}

/// A malformed id cannot name a live record, so it behaves like an unknown
/// one.
fn parse_user_id(raw: &str) -> Result<Uuid, ErrorResponse> {
    Uuid::parse_str(raw).map_err(|_| not_found_response())
}

fn resolve_paging(
    page: Option<u32>,
    page_size: Option<u32>,
    settings: &PaginationSettings,
) -> Result<PageRequest, ErrorResponse> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(settings.default_page_size);

    let mut details = Vec::new();
    if page < 1 {
        details.push(FieldIssue {
            field: "page".to_string(),
            reason: "Page must be at least 1".to_string(),
        });
    }
    if page_size < 1 || page_size > settings.max_page_size {
        details.push(FieldIssue {
            field: "page_size".to_string(),
            reason: format!("Page size must be between 1 and {}", settings.max_page_size),
        });
    }
    if !details.is_empty() {
        return Err(validation_response(details));
    }
    Ok(PageRequest::new(page, page_size))
}

/// Create handler - POST /api/v1/users
pub async fn create_user<R: UserRepository>(
    State(state): State<AppState<R>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ErrorResponse> {
    payload.validate().map_err(request_validation_response)?;

    let (candidate, idempotency_key) = payload.into_parts();
    let user = state
        .users
        .create_user(candidate, idempotency_key)
        .await
        .map_err(domain_error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(user.into())),
    ))
}

/// Read handler - GET /api/v1/users/{id}
pub async fn get_user<R: UserRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let id = parse_user_id(&id)?;
    let user = state
        .users
        .get_user(id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Update handler - PUT /api/v1/users/{id}
pub async fn update_user<R: UserRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let id = parse_user_id(&id)?;
    payload.validate().map_err(request_validation_response)?;

    let user = state
        .users
        .update_user(id, payload.into())
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Delete handler - DELETE /api/v1/users/{id}
pub async fn delete_user<R: UserRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ErrorResponse> {
    let id = parse_user_id(&id)?;
    let user = state
        .users
        .soft_delete_user(id)
        .await
        .map_err(domain_error_response)?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// List handler - GET /api/v1/users
///
/// Listing does not involve the engine: it pages the store directly.
pub async fn list_users<R: UserRepository>(
    State(state): State<AppState<R>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ErrorResponse> {
    let req = resolve_paging(params.page, params.page_size, &state.config.pagination)?;

    let total = state
        .repo
        .count_live()
        .await
        .map_err(domain_error_response)?;
    let rows = state
        .repo
        .list_page(req.offset(), req.limit())
        .await
        .map_err(domain_error_response)?;

    let page = Page::assemble(req, total, rows).map(UserDto::from);
    Ok(Json(ApiResponse::success(page)))
}

/// Search handler - GET /api/v1/users/search?q=
pub async fn search_users<R: UserRepository>(
    State(state): State<AppState<R>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ErrorResponse> {
    if params.q.chars().count() < MIN_SEARCH_QUERY_LEN {
        return Err(validation_response(vec![FieldIssue {
            field: "q".to_string(),
            reason: format!(
                "Search query must be at least {MIN_SEARCH_QUERY_LEN} characters"
            ),
        }]));
    }
    let req = resolve_paging(params.page, params.page_size, &state.config.pagination)?;

    let total = state
        .repo
        .count_search(&params.q)
        .await
        .map_err(domain_error_response)?;
    let rows = state
        .repo
        .search_page(&params.q, req.offset(), req.limit())
        .await
        .map_err(domain_error_response)?;

    let page = Page::assemble(req, total, rows).map(UserDto::from);
    Ok(Json(ApiResponse::success(page)))
}
