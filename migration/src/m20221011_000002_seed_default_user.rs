use sea_orm_migration::prelude::*;

use crate::m20221011_000001_create_user::User;

const DEFAULT_EMAIL: &str = "mickey@example.com";

/// SHA-256 of "pass".
const DEFAULT_PASSWORD_HASH: &str =
    "sha256$d74ff0ee8da3b9806b18c877dbf29bbde50b5bd8e4dad7a3a725000feb82e8f1";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // An existing logins.db may already hold the default account.
        let insert = Query::insert()
            .into_table(User::Table)
            .columns([
                User::Email,
                User::Password,
                User::Name,
                User::ReadToken,
                User::WriteToken,
            ])
            .values_panic([
                DEFAULT_EMAIL.into(),
                DEFAULT_PASSWORD_HASH.into(),
                "mickey".into(),
                "my_read_token".into(),
                "my_write_token".into(),
            ])
            .on_conflict(OnConflict::column(User::Email).do_nothing().to_owned())
            .to_owned();

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(User::Table)
            .and_where(Expr::col(User::Email).eq(DEFAULT_EMAIL))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
