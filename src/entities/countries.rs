use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "countries")]
#[schema(as = Country)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    /// Stored path of the flag image, relative to the media root.
    pub flag: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::studios::Entity")]
    Studios,
    #[sea_orm(has_many = "super::film_countries::Entity")]
    FilmCountries,
}

impl Related<super::studios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Studios.def()
    }
}

impl Related<super::film_countries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FilmCountries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
