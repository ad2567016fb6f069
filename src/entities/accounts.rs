use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Discriminant for the unified account table. The source system kept admins
/// and users in two physical tables; here one table carries both and `kind`
/// tells them apart, which makes the email-uniqueness invariant a single
/// index instead of a cross-table check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "user")]
    User,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Admin => "admin",
            AccountKind::User => "user",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub account_id: i64,
    pub kind: AccountKind,
    /// Stored trimmed and lowercased; unique across admins and users alike.
    pub email: String,
    /// Argon2 PHC string. Never serialized, never logged.
    pub password_hash: String,
    pub role_id: i64,
    /// Admin rows keep their display name here; last_name stays null.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// 13-digit national id. Unique among the rows that have one.
    pub citizen_id: Option<String>,
    pub line_id: Option<String>,
    pub id_card_front: Option<String>,
    pub id_card_back: Option<String>,
    pub selfie: Option<String>,
    pub license_number: Option<String>,
    pub license_image: Option<String>,
    pub agency_name: Option<String>,
    pub two_factor_enabled: bool,
    /// SHA-256 hex of the outstanding reset code, if any. Cleared together
    /// with the expiry in the same transaction that consumes the code.
    pub reset_otp_hash: Option<String>,
    pub reset_otp_expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
