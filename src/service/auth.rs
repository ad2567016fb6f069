use async_trait::async_trait;
use sea_orm::{Set, TransactionTrait};
use std::sync::Arc;

use crate::{
    entities::accounts::{self, AccountKind},
    error::ApiError,
    repo::{accounts::AccountsRepo, roles::RolesRepo},
    service::{
        password::{hash_password, verify_password},
        token::TokenService,
        validate::{is_valid_email, normalize_email},
    },
    state::DatabaseClient,
};

#[derive(Debug)]
pub struct LoginOutput {
    pub token: String,
    pub role: String,
    pub kind: AccountKind,
}

#[derive(Debug)]
pub struct CreateAdminInput {
    pub role_id: Option<i64>,
    pub admin_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify email+password and mint a bearer token. Admin rows win when an
    /// email somehow exists on both kinds; unknown email and wrong password
    /// are indistinguishable to the caller.
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, ApiError>;
    /// Create an elevated account. Role gating happens at the route; this
    /// enforces input shape and email uniqueness. Returns the new id.
    async fn create_admin(&self, input: CreateAdminInput) -> Result<i64, ApiError>;
}

pub struct AuthServiceImpl {
    db: Arc<dyn DatabaseClient>,
    accounts_repo: Arc<dyn AccountsRepo>,
    roles_repo: Arc<dyn RolesRepo>,
    tokens: Arc<dyn TokenService>,
}

impl AuthServiceImpl {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        accounts_repo: Arc<dyn AccountsRepo>,
        roles_repo: Arc<dyn RolesRepo>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            db,
            accounts_repo,
            roles_repo,
            tokens,
        }
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, ApiError> {
        let email = email.trim();
        let password = password.trim();

        if email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "Email and password are required (Spacebar is not allowed)".to_string(),
            ));
        }
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        if password.len() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let normalized = normalize_email(email);
        let accounts = self.accounts_repo.find_by_email(&normalized).await?;
        let Some(account) = accounts.into_iter().next() else {
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(&account.password_hash, password) {
            return Err(ApiError::InvalidCredentials);
        }

        let role = self
            .roles_repo
            .find_by_id(account.role_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("account {} has no role row", account.account_id))
            })?;

        let token = self
            .tokens
            .issue(account.account_id, &role.role_name, account.kind)?;

        Ok(LoginOutput {
            token,
            role: role.role_name,
            kind: account.kind,
        })
    }

    async fn create_admin(&self, input: CreateAdminInput) -> Result<i64, ApiError> {
        let (Some(role_id), Some(admin_name), Some(email), Some(password)) = (
            input.role_id,
            input.admin_name.as_deref(),
            input.email.as_deref(),
            input.password.as_deref(),
        ) else {
            return Err(ApiError::Validation("All fields are required".to_string()));
        };

        let clean_email = normalize_email(email);
        let clean_name = admin_name.trim().to_string();

        if clean_email.is_empty() || clean_name.is_empty() || password.is_empty() {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }
        if !is_valid_email(&clean_email) {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        if password.len() < 6 {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }
        if clean_name.chars().count() < 2 {
            return Err(ApiError::Validation("Admin name is too short".to_string()));
        }

        let password_hash = hash_password(password)?;
        let accounts_repo = self.accounts_repo.clone();
        let roles_repo = self.roles_repo.clone();

        let account = self
            .db
            .conn()
            .transaction(|txn| {
                let accounts_repo = accounts_repo.clone();
                let roles_repo = roles_repo.clone();
                let clean_email = clean_email.clone();
                let clean_name = clean_name.clone();
                let password_hash = password_hash.clone();
                Box::pin(async move {
                    let taken = accounts_repo
                        .find_by_email_for_update(txn, &clean_email, None)
                        .await?;
                    if !taken.is_empty() {
                        return Err(ApiError::Conflict(
                            "Email is already registered".to_string(),
                        ));
                    }

                    if roles_repo.find_by_id_with_txn(txn, role_id).await?.is_none() {
                        return Err(ApiError::Validation("Invalid role".to_string()));
                    }

                    let model = accounts::ActiveModel {
                        kind: Set(AccountKind::Admin),
                        email: Set(clean_email),
                        password_hash: Set(password_hash),
                        role_id: Set(role_id),
                        first_name: Set(Some(clean_name)),
                        two_factor_enabled: Set(false),
                        ..Default::default()
                    };
                    let account = accounts_repo.insert_with_txn(txn, model).await?;
                    Ok::<_, ApiError>(account)
                })
            })
            .await
            .map_err(ApiError::from)?;

        Ok(account.account_id)
    }
}
