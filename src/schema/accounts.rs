use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(
    manager: &SchemaManager<'_>,
    conn: &DatabaseConnection,
) -> Result<(), DbErr> {
    if !manager.has_table("accounts").await? {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::AccountId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Kind).string().not_null())
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Accounts::RoleId).big_integer().not_null())
                    .col(ColumnDef::new(Accounts::FirstName).string())
                    .col(ColumnDef::new(Accounts::LastName).string())
                    .col(ColumnDef::new(Accounts::Phone).string())
                    .col(ColumnDef::new(Accounts::Address).string())
                    .col(ColumnDef::new(Accounts::CitizenId).string())
                    .col(ColumnDef::new(Accounts::LineId).string())
                    .col(ColumnDef::new(Accounts::IdCardFront).string())
                    .col(ColumnDef::new(Accounts::IdCardBack).string())
                    .col(ColumnDef::new(Accounts::Selfie).string())
                    .col(ColumnDef::new(Accounts::LicenseNumber).string())
                    .col(ColumnDef::new(Accounts::LicenseImage).string())
                    .col(ColumnDef::new(Accounts::AgencyName).string())
                    .col(
                        ColumnDef::new(Accounts::TwoFactorEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Accounts::ResetOtpHash).string())
                    .col(
                        ColumnDef::new(Accounts::ResetOtpExpiresAt)
                            .timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Custom("now()".into())),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Custom("now()".into())),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("accounts_role_id_fkey")
                            .from(Accounts::Table, Accounts::RoleId)
                            .to(Roles::Table, Roles::RoleId),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "ALTER TABLE accounts ADD CONSTRAINT accounts_kind_check \
             CHECK (kind IN ('admin','user'))"
                .to_string(),
        ))
        .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE UNIQUE INDEX IF NOT EXISTS accounts_email_unique \
             ON accounts (lower(email))"
                .to_string(),
        ))
        .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE UNIQUE INDEX IF NOT EXISTS accounts_citizen_id_unique \
             ON accounts (citizen_id) WHERE citizen_id IS NOT NULL"
                .to_string(),
        ))
        .await?;
    }

    Ok(())
}

#[derive(Iden)]
enum Accounts {
    Table,
    AccountId,
    Kind,
    Email,
    PasswordHash,
    RoleId,
    FirstName,
    LastName,
    Phone,
    Address,
    CitizenId,
    LineId,
    IdCardFront,
    IdCardBack,
    Selfie,
    LicenseNumber,
    LicenseImage,
    AgencyName,
    TwoFactorEnabled,
    ResetOtpHash,
    ResetOtpExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Roles {
    Table,
    RoleId,
}
