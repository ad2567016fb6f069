use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(
    manager: &SchemaManager<'_>,
    conn: &DatabaseConnection,
) -> Result<(), DbErr> {
    if !manager.has_table("land_unlocks").await? {
        manager
            .create_table(
                Table::create()
                    .table(LandUnlocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LandUnlocks::UnlockId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LandUnlocks::AccountId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LandUnlocks::LandId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LandUnlocks::UnlockType).string().not_null())
                    .col(
                        ColumnDef::new(LandUnlocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Custom("now()".into())),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("land_unlocks_account_id_fkey")
                            .from(LandUnlocks::Table, LandUnlocks::AccountId)
                            .to(Accounts::Table, Accounts::AccountId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("land_unlocks_land_id_fkey")
                            .from(LandUnlocks::Table, LandUnlocks::LandId)
                            .to(Lands::Table, Lands::LandId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "ALTER TABLE land_unlocks ADD CONSTRAINT land_unlocks_unlock_type_check \
             CHECK (unlock_type IN ('owner','contact','boundary','document'))"
                .to_string(),
        ))
        .await?;

        // One row per grant; repeat purchases of the same category collapse here.
        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE UNIQUE INDEX IF NOT EXISTS land_unlocks_grant_unique \
             ON land_unlocks (account_id, land_id, unlock_type)"
                .to_string(),
        ))
        .await?;
    }

    Ok(())
}

#[derive(Iden)]
enum LandUnlocks {
    Table,
    UnlockId,
    AccountId,
    LandId,
    UnlockType,
    CreatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    AccountId,
}

#[derive(Iden)]
enum Lands {
    Table,
    LandId,
}
