use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Document categories a listing can carry. The unlock mapping keys off this:
/// boundary plans sit behind the `boundary` entitlement, deeds and survey
/// maps behind `document`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum LandDocKind {
    #[sea_orm(string_value = "deed")]
    #[serde(rename = "deed")]
    Deed,
    #[sea_orm(string_value = "survey-map")]
    #[serde(rename = "survey-map")]
    SurveyMap,
    #[sea_orm(string_value = "boundary-plan")]
    #[serde(rename = "boundary-plan")]
    BoundaryPlan,
}

impl LandDocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandDocKind::Deed => "deed",
            LandDocKind::SurveyMap => "survey-map",
            LandDocKind::BoundaryPlan => "boundary-plan",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "deed" => Some(LandDocKind::Deed),
            "survey-map" => Some(LandDocKind::SurveyMap),
            "boundary-plan" => Some(LandDocKind::BoundaryPlan),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "land_documents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub document_id: i64,
    pub land_id: i64,
    pub kind: LandDocKind,
    pub file: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
