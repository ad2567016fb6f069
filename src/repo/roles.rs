use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};

use crate::{entities::roles, state::DatabaseClient};

#[async_trait]
pub trait RolesRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<roles::Model>, sea_orm::DbErr>;
    async fn find_by_id_with_txn(
        &self,
        txn: &DatabaseTransaction,
        id: i64,
    ) -> Result<Option<roles::Model>, sea_orm::DbErr>;
    async fn find_by_name_with_txn(
        &self,
        txn: &DatabaseTransaction,
        name: &str,
    ) -> Result<Option<roles::Model>, sea_orm::DbErr>;
}

pub struct SeaOrmRolesRepo {
    db: std::sync::Arc<dyn DatabaseClient>,
}

impl SeaOrmRolesRepo {
    pub fn new(db: std::sync::Arc<dyn DatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RolesRepo for SeaOrmRolesRepo {
    async fn find_by_id(&self, id: i64) -> Result<Option<roles::Model>, sea_orm::DbErr> {
        roles::Entity::find_by_id(id).one(self.db.conn()).await
    }

    async fn find_by_id_with_txn(
        &self,
        txn: &DatabaseTransaction,
        id: i64,
    ) -> Result<Option<roles::Model>, sea_orm::DbErr> {
        roles::Entity::find_by_id(id).one(txn).await
    }

    async fn find_by_name_with_txn(
        &self,
        txn: &DatabaseTransaction,
        name: &str,
    ) -> Result<Option<roles::Model>, sea_orm::DbErr> {
        roles::Entity::find()
            .filter(roles::Column::RoleName.eq(name))
            .one(txn)
            .await
    }
}
