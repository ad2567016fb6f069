use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    handler::{require_role, AuthUser},
    service::{accounts::UpdateProfileInput, auth::CreateAdminInput},
    state::AppState,
};

use crate::entities::accounts;

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub account_id: i64,
    pub email: String,
    pub role: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub line_id: Option<String>,
    pub citizen_id: Option<String>,
    pub agency_name: Option<String>,
    pub license_number: Option<String>,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl ProfileResponse {
    fn from_parts(model: accounts::Model, role: String) -> Self {
        Self {
            account_id: model.account_id,
            email: model.email,
            role,
            kind: model.kind.as_str(),
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            address: model.address,
            line_id: model.line_id,
            citizen_id: model.citizen_id,
            agency_name: model.agency_name,
            license_number: model.license_number,
            two_factor_enabled: model.two_factor_enabled,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "The caller's own profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (account, role) = state.accounts().profile(claims.sub).await?;
    Ok(Json(ProfileResponse::from_parts(account, role)))
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub line_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UpdateProfileResponse {
    pub message: &'static str,
    pub user: ProfileResponse,
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UpdateProfileResponse),
        (status = 400, description = "Validation failure or email taken", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let input = UpdateProfileInput {
        name: request.name,
        lastname: request.lastname,
        phone: request.phone,
        address: request.address,
        line_id: request.line_id,
        email: request.email,
    };
    let (account, role) = state.accounts().update_profile(claims.sub, input).await?;
    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully",
        user: ProfileResponse::from_parts(account, role),
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[utoipa::path(
    put,
    path = "/api/auth/security/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password rotated", body = MessageResponse),
        (status = 400, description = "Wrong current password or weak new one", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts()
        .change_password(
            claims.sub,
            request.current_password.as_deref().unwrap_or_default(),
            request.new_password.as_deref().unwrap_or_default(),
            request.confirm_password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully",
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct TwoFactorRequest {
    pub enabled: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct TwoFactorResponse {
    pub message: &'static str,
    pub enabled: bool,
}

#[utoipa::path(
    post,
    path = "/api/auth/security/2fa",
    request_body = TwoFactorRequest,
    responses(
        (status = 200, description = "Flag stored", body = TwoFactorResponse),
        (status = 403, description = "Admin accounts have no 2FA flag", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn two_factor(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<TwoFactorRequest>,
) -> Result<Json<TwoFactorResponse>, ApiError> {
    let enabled = state
        .accounts()
        .set_two_factor(claims.sub, request.enabled.unwrap_or(false))
        .await?;
    Ok(Json(TwoFactorResponse {
        message: "Two-factor setting updated",
        enabled,
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct AddAdminRequest {
    pub role_id: Option<i64>,
    pub admin_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AddAdminResponse {
    pub message: &'static str,
    #[serde(rename = "adminId")]
    pub admin_id: i64,
}

#[utoipa::path(
    post,
    path = "/api/auth/add-admin",
    request_body = AddAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = AddAdminResponse),
        (status = 400, description = "Invalid fields or email taken", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn add_admin(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Json(request): Json<AddAdminRequest>,
) -> Result<(StatusCode, Json<AddAdminResponse>), ApiError> {
    require_role(&claims, &["admin"])?;
    let admin_id = state
        .auth()
        .create_admin(CreateAdminInput {
            role_id: request.role_id,
            admin_name: request.admin_name,
            email: request.email,
            password: request.password,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AddAdminResponse {
            message: "Admin created successfully",
            admin_id,
        }),
    ))
}

/// One user row as the admin console lists it. Verification image names are
/// included; secrets never are.
#[derive(Serialize, ToSchema)]
pub struct UserSummary {
    pub account_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub citizen_id: Option<String>,
    pub id_card_front: Option<String>,
    pub id_card_back: Option<String>,
    pub selfie: Option<String>,
    pub license_number: Option<String>,
    pub license_image: Option<String>,
    pub agency_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<accounts::Model> for UserSummary {
    fn from(model: accounts::Model) -> Self {
        Self {
            account_id: model.account_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            address: model.address,
            citizen_id: model.citizen_id,
            id_card_front: model.id_card_front,
            id_card_back: model.id_card_back,
            selfie: model.selfie,
            license_number: model.license_number,
            license_image: model.license_image,
            agency_name: model.agency_name,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UsersResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<UserSummary>,
}

#[utoipa::path(
    get,
    path = "/api/auth/users",
    responses(
        (status = 200, description = "Every user account", body = UsersResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UsersResponse>, ApiError> {
    require_role(&claims, &["admin"])?;
    let users = state.accounts().list_users().await?;
    let data: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
    Ok(Json(UsersResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

#[derive(Serialize, ToSchema)]
pub struct UserCountResponse {
    pub total_users: u64,
}

#[utoipa::path(
    get,
    path = "/api/auth/users/count",
    responses(
        (status = 200, description = "How many user accounts exist", body = UserCountResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "accounts"
)]
pub async fn count_users(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserCountResponse>, ApiError> {
    require_role(&claims, &["admin"])?;
    let total_users = state.accounts().count_users().await?;
    Ok(Json(UserCountResponse { total_users }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/profile", get(profile).put(update_profile))
        .route("/api/auth/security/change-password", put(change_password))
        .route("/api/auth/security/2fa", post(two_factor))
        .route("/api/auth/add-admin", post(add_admin))
        .route("/api/auth/users", get(list_users))
        .route("/api/auth/users/count", get(count_users))
        .with_state(state)
}
