use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "languages")]
#[schema(as = Language)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::film_languages::Entity")]
    FilmLanguages,
}

impl Related<super::film_languages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmLanguages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
