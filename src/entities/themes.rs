use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "themes")]
#[schema(as = Theme)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::film_themes::Entity")]
    FilmThemes,
}

impl Related<super::film_themes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmThemes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
