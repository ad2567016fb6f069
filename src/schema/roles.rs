use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(
    manager: &SchemaManager<'_>,
    conn: &DatabaseConnection,
) -> Result<(), DbErr> {
    if !manager.has_table("roles").await? {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::RoleId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::RoleName).string().not_null())
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE UNIQUE INDEX IF NOT EXISTS roles_role_name_unique \
             ON roles (role_name)"
                .to_string(),
        ))
        .await?;
    }

    // Seed the fixed role set. Re-running is a no-op.
    conn.execute(Statement::from_string(
        DbBackend::Postgres,
        "INSERT INTO roles (role_name) VALUES \
         ('buyer'), ('investor'), ('landlord'), ('agent'), ('admin') \
         ON CONFLICT (role_name) DO NOTHING"
            .to_string(),
    ))
    .await?;

    Ok(())
}

#[derive(Iden)]
enum Roles {
    Table,
    RoleId,
    RoleName,
}
