use sea_orm::entity::prelude::*;

/// Listing photo reference. Display order is insertion order (`image_id`);
/// a listing holds at most five.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "land_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub image_id: i64,
    pub land_id: i64,
    pub image: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
