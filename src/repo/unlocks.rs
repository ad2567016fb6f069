use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter};

use crate::{
    entities::land_unlocks::{self, UnlockCategory},
    state::DatabaseClient,
};

#[async_trait]
pub trait UnlocksRepo: Send + Sync {
    /// Bulk-grant entitlements. Rows that already exist are skipped, so a
    /// repeat grant is a no-op instead of an error or a duplicate.
    async fn grant_many_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_unlocks::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr>;
    async fn categories_for(
        &self,
        account_id: i64,
        land_id: i64,
    ) -> Result<Vec<UnlockCategory>, sea_orm::DbErr>;
}

pub struct SeaOrmUnlocksRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmUnlocksRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UnlocksRepo for SeaOrmUnlocksRepo {
    async fn grant_many_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_unlocks::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr> {
        if models.is_empty() {
            return Ok(());
        }
        let result = land_unlocks::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    land_unlocks::Column::AccountId,
                    land_unlocks::Column::LandId,
                    land_unlocks::Column::UnlockType,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(txn)
            .await;
        match result {
            Ok(_) => Ok(()),
            // Every row already existed; for a grant that is success.
            Err(DbErr::RecordNotInserted) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn categories_for(
        &self,
        account_id: i64,
        land_id: i64,
    ) -> Result<Vec<UnlockCategory>, sea_orm::DbErr> {
        let rows = land_unlocks::Entity::find()
            .filter(land_unlocks::Column::AccountId.eq(account_id))
            .filter(land_unlocks::Column::LandId.eq(land_id))
            .all(self.db.conn())
            .await?;
        Ok(rows.into_iter().map(|row| row.unlock_type).collect())
    }
}
