use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{DatabaseTransaction, Set, TransactionTrait};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::{
    entities::accounts,
    error::ApiError,
    repo::accounts::AccountsRepo,
    service::{
        config::ConfigService,
        email,
        password::{hash_password, verify_password},
        validate::{normalize_email, validate_password_strength},
    },
    state::DatabaseClient,
};

#[async_trait]
pub trait ResetService: Send + Sync {
    /// Issue a one-time reset code: stamp its hash and expiry on every row
    /// holding the email, commit, then send the plaintext code. A rejected
    /// send surfaces as an error while the stored code stays valid.
    async fn request(&self, email: &str) -> Result<(), ApiError>;
    /// Consume a code: rotate the secret and null the code fields in one
    /// transaction. Wrong and expired codes get the same answer.
    async fn confirm(
        &self,
        email: &str,
        otp: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError>;
}

pub struct ResetServiceImpl {
    db: Arc<dyn DatabaseClient>,
    accounts_repo: Arc<dyn AccountsRepo>,
    config: Arc<dyn ConfigService>,
}

impl ResetServiceImpl {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        accounts_repo: Arc<dyn AccountsRepo>,
        config: Arc<dyn ConfigService>,
    ) -> Self {
        Self {
            db,
            accounts_repo,
            config,
        }
    }

    /// Uniform 6-digit code, leading zeros kept.
    fn generate_code() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
    }

    fn hash_code(code: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(code.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ResetService for ResetServiceImpl {
    async fn request(&self, email: &str) -> Result<(), ApiError> {
        let normalized = normalize_email(email);
        if normalized.is_empty() {
            return Err(ApiError::Validation("Email is required".to_string()));
        }

        let matches = self.accounts_repo.find_by_email(&normalized).await?;
        if matches.is_empty() {
            return Err(ApiError::NotFound("Email not found".to_string()));
        }

        let code = Self::generate_code();
        let code_hash = Self::hash_code(&code);
        let ttl = self.config.values().reset_otp_ttl_seconds;
        let expires_at = Utc::now() + Duration::seconds(ttl);

        // Single-statement write, committed before the send; no transaction
        // stays open across the email round trip.
        self.accounts_repo
            .set_reset_otp(&normalized, &code_hash, expires_at)
            .await?;

        if let Err(reason) = email::try_send_reset_code(
            self.config.values(),
            &normalized,
            &code,
            ttl,
        )
        .await
        {
            // The stored code stays valid; only the delivery failed.
            return Err(ApiError::Internal(format!(
                "reset code email was rejected: {reason}"
            )));
        }

        Ok(())
    }

    async fn confirm(
        &self,
        email: &str,
        otp: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), ApiError> {
        let normalized = normalize_email(email);
        let otp = otp.trim();

        if normalized.is_empty() || otp.is_empty() || password.is_empty() || confirm_password.is_empty()
        {
            return Err(ApiError::Validation("All fields are required".to_string()));
        }
        if password != confirm_password {
            return Err(ApiError::Validation("Passwords do not match".to_string()));
        }
        validate_password_strength(password)?;

        let code_hash = Self::hash_code(otp);
        let new_hash = hash_password(password)?;

        let accounts_repo = self.accounts_repo.clone();
        let password = password.to_string();

        self.db
            .conn()
            .transaction(|txn| {
                let accounts_repo = accounts_repo.clone();
                let normalized = normalized.clone();
                let code_hash = code_hash.clone();
                let new_hash = new_hash.clone();
                let password = password.clone();
                Box::pin(async move {
                    consume_reset_txn(
                        txn,
                        accounts_repo.as_ref(),
                        &normalized,
                        &code_hash,
                        &new_hash,
                        &password,
                    )
                    .await
                })
            })
            .await
            .map_err(ApiError::from)?;

        Ok(())
    }
}

/// Transaction body of one reset confirmation. The locked read pins the
/// matching rows and the update nulls the code fields, so a code spends
/// exactly once even under concurrent attempts.
async fn consume_reset_txn(
    txn: &DatabaseTransaction,
    accounts_repo: &dyn AccountsRepo,
    email: &str,
    code_hash: &str,
    new_hash: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let rows = accounts_repo
        .find_for_reset_for_update(txn, email, code_hash, Utc::now())
        .await?;

    if rows.is_empty() {
        return Err(ApiError::Validation("Invalid or expired code".to_string()));
    }

    for row in rows {
        if verify_password(&row.password_hash, new_password) {
            return Err(ApiError::Validation(
                "New password must be different from your current password".to_string(),
            ));
        }

        let update = accounts::ActiveModel {
            account_id: Set(row.account_id),
            password_hash: Set(new_hash.to_string()),
            reset_otp_hash: Set(None),
            reset_otp_expires_at: Set(None),
            ..Default::default()
        };
        accounts_repo.update_with_txn(txn, update).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits_with_leading_zeros() {
        for _ in 0..200 {
            let code = ResetServiceImpl::generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn code_hash_is_sha256_hex() {
        let hash = ResetServiceImpl::hash_code("000000");
        assert_eq!(hash.len(), 64);
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
        // Same code, same hash; the lookup depends on it.
        assert_eq!(hash, ResetServiceImpl::hash_code("000000"));
        assert_ne!(hash, ResetServiceImpl::hash_code("000001"));
    }

    use crate::repo::roles::RolesRepo;

    struct TestDatabaseClient {
        conn: sea_orm::DatabaseConnection,
    }

    impl DatabaseClient for TestDatabaseClient {
        fn conn(&self) -> &sea_orm::DatabaseConnection {
            &self.conn
        }
    }

    #[tokio::test]
    #[ignore]
    async fn reset_code_spends_exactly_once() -> Result<(), Box<dyn std::error::Error>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return Ok(());
        };
        let conn = sea_orm::Database::connect(&url).await?;
        crate::schema::apply(&conn).await?;

        let client: Arc<dyn DatabaseClient> = Arc::new(TestDatabaseClient { conn });
        let accounts_repo = crate::repo::accounts::SeaOrmAccountsRepo::new(client.clone());
        let roles_repo = crate::repo::roles::SeaOrmRolesRepo::new(client.clone());

        let txn = client.conn().begin().await?;
        let role = roles_repo
            .find_by_name_with_txn(&txn, "buyer")
            .await?
            .ok_or("buyer role missing")?;

        let email = "reset-otp@example.com";
        let code_hash = ResetServiceImpl::hash_code("123456");
        let seeded = crate::entities::accounts::ActiveModel {
            kind: Set(crate::entities::accounts::AccountKind::User),
            role_id: Set(role.role_id),
            email: Set(email.to_string()),
            password_hash: Set(hash_password("Current1")?),
            reset_otp_hash: Set(Some(code_hash.clone())),
            reset_otp_expires_at: Set(Some((Utc::now() + Duration::seconds(60)).into())),
            two_factor_enabled: Set(false),
            ..Default::default()
        };
        accounts_repo.insert_with_txn(&txn, seeded).await?;

        // Reusing the current password is refused and leaves the code live.
        let same = consume_reset_txn(
            &txn,
            &accounts_repo,
            email,
            &code_hash,
            &hash_password("Current1")?,
            "Current1",
        )
        .await;
        match same {
            Err(ApiError::Validation(message)) => assert_eq!(
                message,
                "New password must be different from your current password"
            ),
            other => panic!("expected a validation error, got {other:?}"),
        }

        consume_reset_txn(
            &txn,
            &accounts_repo,
            email,
            &code_hash,
            &hash_password("Fresh1pw")?,
            "Fresh1pw",
        )
        .await?;

        // Spent: the exact same code now reads as invalid.
        let replay = consume_reset_txn(
            &txn,
            &accounts_repo,
            email,
            &code_hash,
            &hash_password("Other2pw")?,
            "Other2pw",
        )
        .await;
        match replay {
            Err(ApiError::Validation(message)) => assert_eq!(message, "Invalid or expired code"),
            other => panic!("expected a validation error, got {other:?}"),
        }

        txn.rollback().await?;
        Ok(())
    }
}
