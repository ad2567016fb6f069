use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::accounts::{self, AccountKind},
    state::DatabaseClient,
};

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn insert_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr>;
    async fn find_by_id(&self, id: i64) -> Result<Option<accounts::Model>, sea_orm::DbErr>;
    /// All rows holding this email, admin rows first. At most one exists
    /// while the uniqueness invariant holds; callers that only want the
    /// winning row take the head.
    async fn find_by_email(&self, email: &str) -> Result<Vec<accounts::Model>, sea_orm::DbErr>;
    /// Row-locking read against email OR citizen id, used inside the signup
    /// transaction to close the check-then-insert race.
    async fn find_duplicates_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        citizen_id: &str,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr>;
    /// Row-locking read by email, optionally ignoring one account (the
    /// caller's own row during a profile email change).
    async fn find_by_email_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        exclude_account_id: Option<i64>,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr>;
    /// Stamp a fresh reset-code hash and expiry on every row holding this
    /// email. Single statement, autocommit; returns the row count.
    async fn set_reset_otp(
        &self,
        email: &str,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, sea_orm::DbErr>;
    /// Row-locking read for reset consumption: email matches, stored hash
    /// matches, and the code has not expired yet.
    async fn find_for_reset_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        otp_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr>;
    async fn update(
        &self,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr>;
    async fn update_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr>;
    async fn list_users(&self) -> Result<Vec<accounts::Model>, sea_orm::DbErr>;
    async fn count_users(&self) -> Result<u64, sea_orm::DbErr>;
}

pub struct SeaOrmAccountsRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmAccountsRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountsRepo for SeaOrmAccountsRepo {
    async fn insert_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr> {
        model.insert(txn).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find_by_id(id).one(self.db.conn()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<accounts::Model>, sea_orm::DbErr> {
        // "admin" sorts before "user", which is exactly the admin-priority
        // lookup order the login path wants.
        accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .order_by_asc(accounts::Column::Kind)
            .all(self.db.conn())
            .await
    }

    async fn find_duplicates_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        citizen_id: &str,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::Email.eq(email))
                    .add(accounts::Column::CitizenId.eq(citizen_id)),
            )
            .lock_exclusive()
            .all(txn)
            .await
    }

    async fn find_by_email_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        exclude_account_id: Option<i64>,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr> {
        let mut query = accounts::Entity::find().filter(accounts::Column::Email.eq(email));
        if let Some(id) = exclude_account_id {
            query = query.filter(accounts::Column::AccountId.ne(id));
        }
        query.lock_exclusive().all(txn).await
    }

    async fn set_reset_otp(
        &self,
        email: &str,
        otp_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, sea_orm::DbErr> {
        let result = accounts::Entity::update_many()
            .set(accounts::ActiveModel {
                reset_otp_hash: Set(Some(otp_hash.to_string())),
                reset_otp_expires_at: Set(Some(expires_at.into())),
                ..Default::default()
            })
            .filter(accounts::Column::Email.eq(email))
            .exec(self.db.conn())
            .await?;
        Ok(result.rows_affected)
    }

    async fn find_for_reset_for_update(
        &self,
        txn: &DatabaseTransaction,
        email: &str,
        otp_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .filter(accounts::Column::ResetOtpHash.eq(otp_hash))
            .filter(accounts::Column::ResetOtpExpiresAt.gt(now))
            .lock_exclusive()
            .all(txn)
            .await
    }

    async fn update(
        &self,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr> {
        model.update(self.db.conn()).await
    }

    async fn update_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: accounts::ActiveModel,
    ) -> Result<accounts::Model, sea_orm::DbErr> {
        model.update(txn).await
    }

    async fn list_users(&self) -> Result<Vec<accounts::Model>, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Kind.eq(AccountKind::User))
            .order_by_asc(accounts::Column::AccountId)
            .all(self.db.conn())
            .await
    }

    async fn count_users(&self) -> Result<u64, sea_orm::DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Kind.eq(AccountKind::User))
            .count(self.db.conn())
            .await
    }
}
