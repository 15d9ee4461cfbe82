use sea_orm::entity::prelude::*;

/// A local login for the IoT app, holding the InfluxDB tokens used on behalf of the user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    /// `sha256$<hex digest>`
    pub password: String,
    pub name: String,
    #[sea_orm(column_name = "readToken")]
    pub read_token: String,
    #[sea_orm(column_name = "writeToken")]
    pub write_token: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
