use utoipa::OpenApi;

use crate::{
    error::ErrorBody,
    handler::{
        self,
        accounts::{
            AddAdminRequest, AddAdminResponse, ChangePasswordRequest, ProfileResponse,
            TwoFactorRequest, TwoFactorResponse, UpdateProfileRequest, UpdateProfileResponse,
            UserCountResponse, UserSummary, UsersResponse,
        },
        auth::{
            password::{
                ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
                ResetPasswordRequest,
            },
            signup::SignupResponse,
        },
        health::{Banner, Health},
        lands::{
            ContactResponse, CreateLandResponse, DocumentResponse, LandDetailResponse,
            UnlockRequest, UnlockResponse,
        },
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handler::health::root,
        handler::health::health,
        handler::auth::signup::signup,
        handler::auth::password::login,
        handler::auth::password::forgot_password,
        handler::auth::password::reset_password,
        handler::accounts::profile,
        handler::accounts::update_profile,
        handler::accounts::change_password,
        handler::accounts::two_factor,
        handler::accounts::add_admin,
        handler::accounts::list_users,
        handler::accounts::count_users,
        handler::lands::create_land,
        handler::lands::land_detail,
        handler::lands::unlock
    ),
    components(schemas(
        Banner,
        Health,
        ErrorBody,
        SignupResponse,
        LoginRequest,
        LoginResponse,
        MessageResponse,
        ForgotPasswordRequest,
        ResetPasswordRequest,
        ProfileResponse,
        UpdateProfileRequest,
        UpdateProfileResponse,
        ChangePasswordRequest,
        TwoFactorRequest,
        TwoFactorResponse,
        AddAdminRequest,
        AddAdminResponse,
        UserSummary,
        UsersResponse,
        UserCountResponse,
        CreateLandResponse,
        ContactResponse,
        DocumentResponse,
        LandDetailResponse,
        UnlockRequest,
        UnlockResponse
    )),
    tags(
        (name = "health", description = "Liveness probes"),
        (name = "auth", description = "Signup, login, and password reset"),
        (name = "accounts", description = "Profile, security settings, and admin console"),
        (name = "lands", description = "Listings, paid unlocks, and masked detail views")
    )
)]
pub struct ApiDoc;
