use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ErrorBody},
    state::AppState,
};

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub role: String,
    /// `admin` or `user`; frontends branch on this before the role.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Malformed credentials", body = ErrorBody),
        (status = 401, description = "Unknown email or wrong password", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let output = state
        .auth()
        .login(
            request.email.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(LoginResponse {
        message: "Login success",
        token: output.token,
        role: output.role,
        kind: output.kind.as_str(),
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset code sent", body = MessageResponse),
        (status = 404, description = "Email not registered", body = ErrorBody),
        (status = 500, description = "Code email rejected", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .reset()
        .request(request.email.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(MessageResponse {
        message: "Password reset code sent to your email",
    }))
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password rotated", body = MessageResponse),
        (status = 400, description = "Invalid, expired, or reused code", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .reset()
        .confirm(
            request.email.as_deref().unwrap_or_default(),
            request.otp.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
            request.confirm_password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset successfully",
    }))
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .with_state(state)
}
