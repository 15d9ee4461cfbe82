pub use sea_orm_migration::prelude::*;

mod m20221011_000001_create_user;
mod m20221011_000002_seed_default_user;

/// Name of the migration that seeds the default login, used by callers that
/// announce the default account on first start.
pub const SEED_DEFAULT_USER: &str = "m20221011_000002_seed_default_user";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20221011_000001_create_user::Migration),
            Box::new(m20221011_000002_seed_default_user::Migration),
        ]
    }
}
