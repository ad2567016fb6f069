use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Entitlement categories a user can buy on a listing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum UnlockCategory {
    /// Seller name and agency.
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Phone and LINE id.
    #[sea_orm(string_value = "contact")]
    Contact,
    /// Boundary-plan documents.
    #[sea_orm(string_value = "boundary")]
    Boundary,
    /// Deed and survey-map documents.
    #[sea_orm(string_value = "document")]
    Document,
}

impl UnlockCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnlockCategory::Owner => "owner",
            UnlockCategory::Contact => "contact",
            UnlockCategory::Boundary => "boundary",
            UnlockCategory::Document => "document",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(UnlockCategory::Owner),
            "contact" => Some(UnlockCategory::Contact),
            "boundary" => Some(UnlockCategory::Boundary),
            "document" => Some(UnlockCategory::Document),
            _ => None,
        }
    }
}

/// One granted (account, land, category) entitlement. The unique index over
/// the triple plus `ON CONFLICT DO NOTHING` inserts make repeated grants
/// no-ops rather than duplicates or errors.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "land_unlocks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub unlock_id: i64,
    pub account_id: i64,
    pub land_id: i64,
    pub unlock_type: UnlockCategory,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
