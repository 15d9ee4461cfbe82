use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // camelCase token columns are shared with existing logins.db files.
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Email).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(User::Password).string_len(100).not_null())
                    .col(ColumnDef::new(User::Name).string_len(1000).not_null())
                    .col(ColumnDef::new(User::ReadToken).string_len(100).not_null())
                    .col(ColumnDef::new(User::WriteToken).string_len(100).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Email,
    Password,
    Name,
    #[sea_orm(iden = "readToken")]
    ReadToken,
    #[sea_orm(iden = "writeToken")]
    WriteToken,
}
