use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
};

use crate::{
    entities::{land_documents, land_images, lands},
    state::DatabaseClient,
};

#[async_trait]
pub trait LandsRepo: Send + Sync {
    async fn insert_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: lands::ActiveModel,
    ) -> Result<lands::Model, sea_orm::DbErr>;
    async fn insert_images_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_images::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr>;
    async fn insert_documents_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_documents::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr>;
    async fn find_by_id(&self, id: i64) -> Result<Option<lands::Model>, sea_orm::DbErr>;
    async fn images_for(&self, land_id: i64)
        -> Result<Vec<land_images::Model>, sea_orm::DbErr>;
    async fn documents_for(
        &self,
        land_id: i64,
    ) -> Result<Vec<land_documents::Model>, sea_orm::DbErr>;
    /// Relative single-statement bump; no read-modify-write, so concurrent
    /// detail views never lose an increment.
    async fn increment_view_count(&self, land_id: i64) -> Result<(), sea_orm::DbErr>;
}

pub struct SeaOrmLandsRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmLandsRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LandsRepo for SeaOrmLandsRepo {
    async fn insert_with_txn(
        &self,
        txn: &DatabaseTransaction,
        model: lands::ActiveModel,
    ) -> Result<lands::Model, sea_orm::DbErr> {
        model.insert(txn).await
    }

    async fn insert_images_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_images::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr> {
        if models.is_empty() {
            return Ok(());
        }
        land_images::Entity::insert_many(models).exec(txn).await?;
        Ok(())
    }

    async fn insert_documents_with_txn(
        &self,
        txn: &DatabaseTransaction,
        models: Vec<land_documents::ActiveModel>,
    ) -> Result<(), sea_orm::DbErr> {
        if models.is_empty() {
            return Ok(());
        }
        land_documents::Entity::insert_many(models).exec(txn).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<lands::Model>, sea_orm::DbErr> {
        lands::Entity::find_by_id(id).one(self.db.conn()).await
    }

    async fn images_for(
        &self,
        land_id: i64,
    ) -> Result<Vec<land_images::Model>, sea_orm::DbErr> {
        land_images::Entity::find()
            .filter(land_images::Column::LandId.eq(land_id))
            .order_by_asc(land_images::Column::ImageId)
            .all(self.db.conn())
            .await
    }

    async fn documents_for(
        &self,
        land_id: i64,
    ) -> Result<Vec<land_documents::Model>, sea_orm::DbErr> {
        land_documents::Entity::find()
            .filter(land_documents::Column::LandId.eq(land_id))
            .order_by_asc(land_documents::Column::DocumentId)
            .all(self.db.conn())
            .await
    }

    async fn increment_view_count(&self, land_id: i64) -> Result<(), sea_orm::DbErr> {
        lands::Entity::update_many()
            .col_expr(
                lands::Column::ViewCount,
                Expr::col(lands::Column::ViewCount).add(1),
            )
            .filter(lands::Column::LandId.eq(land_id))
            .exec(self.db.conn())
            .await?;
        Ok(())
    }
}
