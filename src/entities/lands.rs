use sea_orm::entity::prelude::*;

/// A land listing. The seller's contact columns are a snapshot taken at
/// creation time, so profile edits never change what a buyer unlocked.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lands")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub land_id: i64,
    pub seller_id: i64,
    pub rai: i32,
    pub ngan: i32,
    pub wa: f64,
    /// rai * 400 + ngan * 100 + wa, fixed at creation.
    pub area_sqwa: f64,
    pub frontage_width: f64,
    pub price_per_sqwa: f64,
    pub price_total: f64,
    pub seller_name: String,
    pub agency_name: Option<String>,
    pub phone: String,
    pub line_id: String,
    pub view_count: i64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
