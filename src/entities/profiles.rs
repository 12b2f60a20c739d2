use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// External identity id from the auth provider.
    #[sea_orm(unique)]
    pub user_id: String,

    pub name: String,

    pub email: String,

    pub image_url: String,

    /// Random-suffixed handle, not unique.
    pub username: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
