use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "films")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub original_title: String,
    pub tagline: String,
    pub year: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Running time in minutes.
    pub duration: Option<i32>,
    pub poster: Option<String>,
    pub background: Option<String>,
    pub trailer_url: String,
    pub release_date: Option<Date>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::film_genres::Entity")]
    FilmGenres,
    #[sea_orm(has_many = "super::film_themes::Entity")]
    FilmThemes,
    #[sea_orm(has_many = "super::film_studios::Entity")]
    FilmStudios,
    #[sea_orm(has_many = "super::film_countries::Entity")]
    FilmCountries,
    #[sea_orm(has_many = "super::film_languages::Entity")]
    FilmLanguages,
}

impl Related<super::genres::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_genres::Relation::Genres.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_genres::Relation::Films.def().rev())
    }
}

impl Related<super::themes::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_themes::Relation::Themes.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_themes::Relation::Films.def().rev())
    }
}

impl Related<super::studios::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_studios::Relation::Studios.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_studios::Relation::Films.def().rev())
    }
}

impl Related<super::countries::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_countries::Relation::Countries.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_countries::Relation::Films.def().rev())
    }
}

impl Related<super::languages::Entity> for Entity {
    fn to() -> RelationDef {
        super::film_languages::Relation::Languages.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::film_languages::Relation::Films.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
