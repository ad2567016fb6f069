use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, Statement};
use sea_orm_migration::prelude::*;

pub async fn apply(
    manager: &SchemaManager<'_>,
    conn: &DatabaseConnection,
) -> Result<(), DbErr> {
    if !manager.has_table("lands").await? {
        manager
            .create_table(
                Table::create()
                    .table(Lands::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lands::LandId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lands::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(Lands::Rai).integer().not_null())
                    .col(ColumnDef::new(Lands::Ngan).integer().not_null())
                    .col(ColumnDef::new(Lands::Wa).double().not_null())
                    .col(ColumnDef::new(Lands::AreaSqwa).double().not_null())
                    .col(ColumnDef::new(Lands::FrontageWidth).double().not_null())
                    .col(ColumnDef::new(Lands::PricePerSqwa).double().not_null())
                    .col(ColumnDef::new(Lands::PriceTotal).double().not_null())
                    .col(ColumnDef::new(Lands::SellerName).string().not_null())
                    .col(ColumnDef::new(Lands::AgencyName).string())
                    .col(ColumnDef::new(Lands::Phone).string().not_null())
                    .col(ColumnDef::new(Lands::LineId).string().not_null())
                    .col(
                        ColumnDef::new(Lands::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Lands::Status)
                            .string()
                            .not_null()
                            .default("broadcast"),
                    )
                    .col(
                        ColumnDef::new(Lands::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Custom("now()".into())),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("lands_seller_id_fkey")
                            .from(Lands::Table, Lands::SellerId)
                            .to(Accounts::Table, Accounts::AccountId),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE INDEX IF NOT EXISTS lands_seller_id_idx \
             ON lands (seller_id)"
                .to_string(),
        ))
        .await?;
    }

    if !manager.has_table("land_images").await? {
        manager
            .create_table(
                Table::create()
                    .table(LandImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LandImages::ImageId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LandImages::LandId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LandImages::Image).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("land_images_land_id_fkey")
                            .from(LandImages::Table, LandImages::LandId)
                            .to(Lands::Table, Lands::LandId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE INDEX IF NOT EXISTS land_images_land_id_idx \
             ON land_images (land_id)"
                .to_string(),
        ))
        .await?;
    }

    if !manager.has_table("land_documents").await? {
        manager
            .create_table(
                Table::create()
                    .table(LandDocuments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LandDocuments::DocumentId)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LandDocuments::LandId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LandDocuments::Kind).string().not_null())
                    .col(ColumnDef::new(LandDocuments::File).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("land_documents_land_id_fkey")
                            .from(LandDocuments::Table, LandDocuments::LandId)
                            .to(Lands::Table, Lands::LandId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "ALTER TABLE land_documents ADD CONSTRAINT land_documents_kind_check \
             CHECK (kind IN ('deed','survey-map','boundary-plan'))"
                .to_string(),
        ))
        .await?;

        conn.execute(Statement::from_string(
            DbBackend::Postgres,
            "CREATE INDEX IF NOT EXISTS land_documents_land_id_idx \
             ON land_documents (land_id)"
                .to_string(),
        ))
        .await?;
    }

    Ok(())
}

#[derive(Iden)]
enum Lands {
    Table,
    LandId,
    SellerId,
    Rai,
    Ngan,
    Wa,
    AreaSqwa,
    FrontageWidth,
    PricePerSqwa,
    PriceTotal,
    SellerName,
    AgencyName,
    Phone,
    LineId,
    ViewCount,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum LandImages {
    Table,
    ImageId,
    LandId,
    Image,
}

#[derive(Iden)]
enum LandDocuments {
    Table,
    DocumentId,
    LandId,
    Kind,
    File,
}

#[derive(Iden)]
enum Accounts {
    Table,
    AccountId,
}
