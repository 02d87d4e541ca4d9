use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resellers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resellers::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Resellers::LegalName).string().not_null())
                    .col(ColumnDef::new(Resellers::TradeName).string().null())
                    .col(
                        ColumnDef::new(Resellers::Cnpj)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Resellers::Email).string().not_null())
                    .col(ColumnDef::new(Resellers::Phone).string().null())
                    .col(ColumnDef::new(Resellers::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Resellers::UpdatedAt).timestamp().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resellers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Resellers {
    Table,
    Id,
    LegalName,
    TradeName,
    Cnpj,
    Email,
    Phone,
    CreatedAt,
    UpdatedAt,
}
