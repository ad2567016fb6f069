use async_trait::async_trait;
use sea_orm::{Set, TransactionTrait};
use std::sync::Arc;

use crate::{
    entities::accounts::{self, AccountKind},
    error::ApiError,
    repo::{accounts::AccountsRepo, roles::RolesRepo},
    service::{
        password::{hash_password, verify_password},
        validate::{
            is_exact_digits, is_person_name, is_valid_email, normalize_email,
            validate_password_strength,
        },
    },
    state::DatabaseClient,
};

/// Profile fields a caller may change. Absent fields keep their value;
/// present fields are validated like the signup equivalents.
#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub line_id: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait AccountsService: Send + Sync {
    /// The caller's own row plus its resolved role name.
    async fn profile(&self, account_id: i64) -> Result<(accounts::Model, String), ApiError>;
    /// Apply a partial profile update. An email change re-runs the locked
    /// uniqueness check, ignoring the caller's own row.
    async fn update_profile(
        &self,
        account_id: i64,
        input: UpdateProfileInput,
    ) -> Result<(accounts::Model, String), ApiError>;
    async fn change_password(
        &self,
        account_id: i64,
        current: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError>;
    /// Toggle the 2FA flag. User accounts only.
    async fn set_two_factor(&self, account_id: i64, enabled: bool) -> Result<bool, ApiError>;
    async fn list_users(&self) -> Result<Vec<accounts::Model>, ApiError>;
    async fn count_users(&self) -> Result<u64, ApiError>;
}

pub struct AccountsServiceImpl {
    db: Arc<dyn DatabaseClient>,
    accounts_repo: Arc<dyn AccountsRepo>,
    roles_repo: Arc<dyn RolesRepo>,
}

impl AccountsServiceImpl {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        accounts_repo: Arc<dyn AccountsRepo>,
        roles_repo: Arc<dyn RolesRepo>,
    ) -> Self {
        Self {
            db,
            accounts_repo,
            roles_repo,
        }
    }

    async fn load(&self, account_id: i64) -> Result<accounts::Model, ApiError> {
        self.accounts_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    async fn role_name_of(&self, account: &accounts::Model) -> Result<String, ApiError> {
        let role = self
            .roles_repo
            .find_by_id(account.role_id)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("account {} has no role row", account.account_id))
            })?;
        Ok(role.role_name)
    }
}

#[async_trait]
impl AccountsService for AccountsServiceImpl {
    async fn profile(&self, account_id: i64) -> Result<(accounts::Model, String), ApiError> {
        let account = self.load(account_id).await?;
        let role_name = self.role_name_of(&account).await?;
        Ok((account, role_name))
    }

    async fn update_profile(
        &self,
        account_id: i64,
        input: UpdateProfileInput,
    ) -> Result<(accounts::Model, String), ApiError> {
        let account = self.load(account_id).await?;

        let mut update = accounts::ActiveModel {
            account_id: Set(account_id),
            ..Default::default()
        };

        if let Some(name) = input.name.as_deref() {
            let name = name.trim();
            if !is_person_name(name) {
                return Err(ApiError::Validation(
                    "First and last names must contain only letters.".to_string(),
                ));
            }
            update.first_name = Set(Some(name.to_string()));
        }
        if let Some(lastname) = input.lastname.as_deref() {
            let lastname = lastname.trim();
            if !is_person_name(lastname) {
                return Err(ApiError::Validation(
                    "First and last names must contain only letters.".to_string(),
                ));
            }
            update.last_name = Set(Some(lastname.to_string()));
        }
        if let Some(phone) = input.phone.as_deref() {
            let phone = phone.trim();
            if !is_exact_digits(phone, 10) {
                return Err(ApiError::Validation(
                    "Phone number must be 10 digits.".to_string(),
                ));
            }
            update.phone = Set(Some(phone.to_string()));
        }
        if let Some(address) = input.address.as_deref() {
            let address = address.trim();
            if address.is_empty() {
                return Err(ApiError::Validation(
                    "Missing required information.".to_string(),
                ));
            }
            update.address = Set(Some(address.to_string()));
        }
        if let Some(line_id) = input.line_id.as_deref() {
            let line_id = line_id.trim();
            if line_id.is_empty() {
                return Err(ApiError::Validation(
                    "Missing required information.".to_string(),
                ));
            }
            update.line_id = Set(Some(line_id.to_string()));
        }

        let new_email = match input.email.as_deref() {
            Some(raw) => {
                let normalized = normalize_email(raw);
                if !is_valid_email(&normalized) {
                    return Err(ApiError::Validation("Invalid email format.".to_string()));
                }
                if normalized != account.email {
                    update.email = Set(normalized.clone());
                    Some(normalized)
                } else {
                    None
                }
            }
            None => None,
        };

        let accounts_repo = self.accounts_repo.clone();
        let updated = self
            .db
            .conn()
            .transaction(|txn| {
                let accounts_repo = accounts_repo.clone();
                let update = update.clone();
                let new_email = new_email.clone();
                Box::pin(async move {
                    if let Some(email) = new_email.as_deref() {
                        let taken = accounts_repo
                            .find_by_email_for_update(txn, email, Some(account_id))
                            .await?;
                        if !taken.is_empty() {
                            return Err(ApiError::Conflict(
                                "Email is already registered".to_string(),
                            ));
                        }
                    }
                    let updated = accounts_repo.update_with_txn(txn, update).await?;
                    Ok::<_, ApiError>(updated)
                })
            })
            .await
            .map_err(ApiError::from)?;

        let role_name = self.role_name_of(&updated).await?;
        Ok((updated, role_name))
    }

    async fn change_password(
        &self,
        account_id: i64,
        current: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        if current.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }
        if new_password != confirm_password {
            return Err(ApiError::Validation("Passwords do not match".to_string()));
        }
        validate_password_strength(new_password)?;

        let account = self.load(account_id).await?;
        if !verify_password(&account.password_hash, current) {
            return Err(ApiError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }
        if current == new_password {
            return Err(ApiError::Validation(
                "New password must be different from your current password".to_string(),
            ));
        }

        let update = accounts::ActiveModel {
            account_id: Set(account_id),
            password_hash: Set(hash_password(new_password)?),
            ..Default::default()
        };
        self.accounts_repo.update(update).await?;
        Ok(())
    }

    async fn set_two_factor(&self, account_id: i64, enabled: bool) -> Result<bool, ApiError> {
        let account = self.load(account_id).await?;
        if account.kind == AccountKind::Admin {
            return Err(ApiError::Forbidden(
                "Two-factor authentication is only available for user accounts".to_string(),
            ));
        }

        let update = accounts::ActiveModel {
            account_id: Set(account_id),
            two_factor_enabled: Set(enabled),
            ..Default::default()
        };
        let updated = self.accounts_repo.update(update).await?;
        Ok(updated.two_factor_enabled)
    }

    async fn list_users(&self) -> Result<Vec<accounts::Model>, ApiError> {
        Ok(self.accounts_repo.list_users().await?)
    }

    async fn count_users(&self) -> Result<u64, ApiError> {
        Ok(self.accounts_repo.count_users().await?)
    }
}
