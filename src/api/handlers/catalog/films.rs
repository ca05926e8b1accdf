use super::studios::{StudioResponse, with_countries};
use super::{check_choices, check_references, dedup_ids, not_found, replace_links};
use crate::api::payload::{
    WriteMode, blank_or_url, field_errors, given, given_str, non_negative, not_null, require, require_text,
};
use crate::AppState;
use crate::api::error::{AppError, FieldErrors};
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, choice_ids, exact_int, order, search_condition};
use crate::entities::{
    countries, film_countries, film_genres, film_languages, film_studios, film_themes, films,
    genres, languages, prelude::*, studios, themes,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    sea_query::{Query as SubQuery, SimpleExpr},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Summary shape used by the list endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct FilmListItem {
    pub id: i32,
    pub title: String,
    pub year: i32,
    pub poster: Option<String>,
}

impl From<films::Model> for FilmListItem {
    fn from(film: films::Model) -> Self {
        Self {
            id: film.id,
            title: film.title,
            year: film.year,
            poster: film.poster,
        }
    }
}

/// Full shape with related entities expanded.
#[derive(Debug, Serialize, ToSchema)]
pub struct FilmDetail {
    pub id: i32,
    pub title: String,
    pub original_title: String,
    pub tagline: String,
    pub year: i32,
    pub description: String,
    pub duration: Option<i32>,
    pub poster: Option<String>,
    pub background: Option<String>,
    pub trailer_url: String,
    pub release_date: Option<NaiveDate>,
    #[schema(value_type = Vec<Genre>)]
    pub genres: Vec<genres::Model>,
    #[schema(value_type = Vec<Theme>)]
    pub themes: Vec<themes::Model>,
    pub studios: Vec<StudioResponse>,
    #[schema(value_type = Vec<Country>)]
    pub countries: Vec<countries::Model>,
    #[schema(value_type = Vec<Language>)]
    pub languages: Vec<languages::Model>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Write shape: related entities are referenced by id. A list that is present
/// replaces the film's current memberships; an absent list leaves them alone.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct FilmPayload {
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub title: Option<Option<String>>,
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub original_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub tagline: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>, nullable)]
    pub duration: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub poster: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub background: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub trailer_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date, nullable)]
    pub release_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<i32>>)]
    pub genres: Option<Option<Vec<i32>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<i32>>)]
    pub themes: Option<Option<Vec<i32>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<i32>>)]
    pub studios: Option<Option<Vec<i32>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<i32>>)]
    pub countries: Option<Option<Vec<i32>>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Vec<i32>>)]
    pub languages: Option<Option<Vec<i32>>>,
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    payload: &FilmPayload,
    mode: WriteMode,
) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    not_null(&mut errors, "original_title", &payload.original_title);
    not_null(&mut errors, "tagline", &payload.tagline);
    not_null(&mut errors, "description", &payload.description);
    not_null(&mut errors, "trailer_url", &payload.trailer_url);
    require_text(&mut errors, mode, "title", &payload.title);
    require(&mut errors, mode, "year", &payload.year);
    non_negative(&mut errors, "year", given(&payload.year).copied());
    non_negative(&mut errors, "duration", payload.duration.flatten());
    blank_or_url(&mut errors, "trailer_url", given_str(&payload.trailer_url));

    if let Some(Some(ids)) = &payload.genres {
        check_references::<Genres, _>(db, &mut errors, "genres", genres::Column::Id, ids).await?;
    }
    if let Some(Some(ids)) = &payload.themes {
        check_references::<Themes, _>(db, &mut errors, "themes", themes::Column::Id, ids).await?;
    }
    if let Some(Some(ids)) = &payload.studios {
        check_references::<Studios, _>(db, &mut errors, "studios", studios::Column::Id, ids)
            .await?;
    }
    if let Some(Some(ids)) = &payload.countries {
        check_references::<Countries, _>(db, &mut errors, "countries", countries::Column::Id, ids)
            .await?;
    }
    if let Some(Some(ids)) = &payload.languages {
        check_references::<Languages, _>(db, &mut errors, "languages", languages::Column::Id, ids)
            .await?;
    }

    errors.into_result()
}

async fn detail<C: ConnectionTrait>(db: &C, film: films::Model) -> Result<FilmDetail, AppError> {
    let genres = film
        .find_related(Genres)
        .order_by_asc(genres::Column::Id)
        .all(db)
        .await?;
    let themes = film
        .find_related(Themes)
        .order_by_asc(themes::Column::Id)
        .all(db)
        .await?;
    let studios = film
        .find_related(Studios)
        .order_by_asc(studios::Column::Id)
        .all(db)
        .await?;
    let countries = film
        .find_related(Countries)
        .order_by_asc(countries::Column::Id)
        .all(db)
        .await?;
    let languages = film
        .find_related(Languages)
        .order_by_asc(languages::Column::Id)
        .all(db)
        .await?;

    Ok(FilmDetail {
        studios: with_countries(db, studios).await?,
        genres,
        themes,
        countries,
        languages,
        id: film.id,
        title: film.title,
        original_title: film.original_title,
        tagline: film.tagline,
        year: film.year,
        description: film.description,
        duration: film.duration,
        poster: film.poster,
        background: film.background,
        trailer_url: film.trailer_url,
        release_date: film.release_date,
        created_at: film.created_at,
        updated_at: film.updated_at,
    })
}

/// `films.id IN (SELECT film_id FROM <join> WHERE <other> IN (ids))`
fn member_of_any<J>(film_column: J::Column, other_column: J::Column, ids: Vec<i32>) -> SimpleExpr
where
    J: EntityTrait,
{
    films::Column::Id.in_subquery(
        SubQuery::select()
            .column(film_column)
            .from(J::default())
            .and_where(other_column.is_in(ids))
            .to_owned(),
    )
}

/// Rewrites whichever membership lists the payload carries.
async fn write_links<C: ConnectionTrait>(
    db: &C,
    film_id: i32,
    payload: &FilmPayload,
) -> Result<(), AppError> {
    if let Some(Some(ids)) = &payload.genres {
        let rows = dedup_ids(ids)
            .into_iter()
            .map(|genre_id| film_genres::ActiveModel {
                film_id: Set(film_id),
                genre_id: Set(genre_id),
            })
            .collect();
        replace_links::<FilmGenres, _>(db, film_genres::Column::FilmId, film_id, rows).await?;
    }
    if let Some(Some(ids)) = &payload.themes {
        let rows = dedup_ids(ids)
            .into_iter()
            .map(|theme_id| film_themes::ActiveModel {
                film_id: Set(film_id),
                theme_id: Set(theme_id),
            })
            .collect();
        replace_links::<FilmThemes, _>(db, film_themes::Column::FilmId, film_id, rows).await?;
    }
    if let Some(Some(ids)) = &payload.studios {
        let rows = dedup_ids(ids)
            .into_iter()
            .map(|studio_id| film_studios::ActiveModel {
                film_id: Set(film_id),
                studio_id: Set(studio_id),
            })
            .collect();
        replace_links::<FilmStudios, _>(db, film_studios::Column::FilmId, film_id, rows).await?;
    }
    if let Some(Some(ids)) = &payload.countries {
        let rows = dedup_ids(ids)
            .into_iter()
            .map(|country_id| film_countries::ActiveModel {
                film_id: Set(film_id),
                country_id: Set(country_id),
            })
            .collect();
        replace_links::<FilmCountries, _>(db, film_countries::Column::FilmId, film_id, rows)
            .await?;
    }
    if let Some(Some(ids)) = &payload.languages {
        let rows = dedup_ids(ids)
            .into_iter()
            .map(|language_id| film_languages::ActiveModel {
                film_id: Set(film_id),
                language_id: Set(language_id),
            })
            .collect();
        replace_links::<FilmLanguages, _>(db, film_languages::Column::FilmId, film_id, rows)
            .await?;
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/films/",
    params(
        ("year" = Option<i32>, Query, description = "Exact release year"),
        ("genres" = Option<Vec<i32>>, Query, description = "Genre ids; repeat the key to match any of several"),
        ("themes" = Option<Vec<i32>>, Query, description = "Theme ids"),
        ("studios" = Option<Vec<i32>>, Query, description = "Studio ids"),
        ("countries" = Option<Vec<i32>>, Query, description = "Country ids"),
        ("languages" = Option<Vec<i32>>, Query, description = "Language ids"),
        ("search" = Option<String>, Query, description = "Terms matched against title, original_title, tagline and description"),
        ("ordering" = Option<String>, Query, description = "id, year, title, duration; prefix with - for descending")
    ),
    responses(
        (status = 200, description = "Film summaries", body = [FilmListItem]),
        (status = 400, description = "Malformed or unknown filter value")
    ),
    tag = "films"
)]
pub async fn list_films(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<FilmListItem>>, AppError> {
    let mut errors = FieldErrors::new();
    let year = exact_int(&params, "year", &mut errors);
    let genre_ids = choice_ids(&params, "genres", &mut errors);
    let theme_ids = choice_ids(&params, "themes", &mut errors);
    let studio_ids = choice_ids(&params, "studios", &mut errors);
    let country_ids = choice_ids(&params, "countries", &mut errors);
    let language_ids = choice_ids(&params, "languages", &mut errors);
    let db = &state.db;
    check_choices::<Genres, _>(db, &mut errors, "genres", genres::Column::Id, &genre_ids).await?;
    check_choices::<Themes, _>(db, &mut errors, "themes", themes::Column::Id, &theme_ids).await?;
    check_choices::<Studios, _>(db, &mut errors, "studios", studios::Column::Id, &studio_ids)
        .await?;
    check_choices::<Countries, _>(db, &mut errors, "countries", countries::Column::Id, &country_ids)
        .await?;
    check_choices::<Languages, _>(
        db,
        &mut errors,
        "languages",
        languages::Column::Id,
        &language_ids,
    )
    .await?;
    errors.into_result()?;

    let mut select = Films::find();
    if let Some(year) = year {
        select = select.filter(films::Column::Year.eq(year));
    }
    if !genre_ids.is_empty() {
        select = select.filter(member_of_any::<FilmGenres>(
            film_genres::Column::FilmId,
            film_genres::Column::GenreId,
            genre_ids,
        ));
    }
    if !theme_ids.is_empty() {
        select = select.filter(member_of_any::<FilmThemes>(
            film_themes::Column::FilmId,
            film_themes::Column::ThemeId,
            theme_ids,
        ));
    }
    if !studio_ids.is_empty() {
        select = select.filter(member_of_any::<FilmStudios>(
            film_studios::Column::FilmId,
            film_studios::Column::StudioId,
            studio_ids,
        ));
    }
    if !country_ids.is_empty() {
        select = select.filter(member_of_any::<FilmCountries>(
            film_countries::Column::FilmId,
            film_countries::Column::CountryId,
            country_ids,
        ));
    }
    if !language_ids.is_empty() {
        select = select.filter(member_of_any::<FilmLanguages>(
            film_languages::Column::FilmId,
            film_languages::Column::LanguageId,
            language_ids,
        ));
    }
    if let Some(cond) = search_condition(
        &params,
        &[
            films::Column::Title,
            films::Column::OriginalTitle,
            films::Column::Tagline,
            films::Column::Description,
        ],
    ) {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[
            ("id", films::Column::Id),
            ("year", films::Column::Year),
            ("title", films::Column::Title),
            ("duration", films::Column::Duration),
        ],
        films::Column::Id,
    );

    let films = select.all(&state.db).await?;
    Ok(Json(films.into_iter().map(FilmListItem::from).collect()))
}

#[utoipa::path(
    post,
    path = "/films/",
    request_body = FilmPayload,
    responses(
        (status = 201, description = "Film created", body = FilmDetail),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "films"
)]
pub async fn create_film(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<FilmPayload>,
) -> Result<(StatusCode, Json<FilmDetail>), AppError> {
    validate(&state.db, &payload, WriteMode::Create).await?;

    let now = Utc::now();
    let txn = state.db.begin().await?;
    let film = films::ActiveModel {
        title: Set(payload.title.clone().flatten().unwrap_or_default()),
        original_title: Set(payload.original_title.clone().flatten().unwrap_or_default()),
        tagline: Set(payload.tagline.clone().flatten().unwrap_or_default()),
        year: Set(payload.year.flatten().unwrap_or_default()),
        description: Set(payload.description.clone().flatten().unwrap_or_default()),
        duration: Set(payload.duration.flatten()),
        poster: Set(payload.poster.clone().flatten()),
        background: Set(payload.background.clone().flatten()),
        trailer_url: Set(payload.trailer_url.clone().flatten().unwrap_or_default()),
        release_date: Set(payload.release_date.flatten()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    write_links(&txn, film.id, &payload).await?;
    txn.commit().await?;

    tracing::info!("🎞️ Film {} ({}) created", film.title, film.year);
    Ok((StatusCode::CREATED, Json(detail(&state.db, film).await?)))
}

#[utoipa::path(
    get,
    path = "/films/{id}/",
    params(("id" = i32, Path, description = "Film id")),
    responses(
        (status = 200, description = "Film with related entities", body = FilmDetail),
        (status = 404, description = "Not found")
    ),
    tag = "films"
)]
pub async fn get_film(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FilmDetail>, AppError> {
    let film = Films::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("film"))?;
    Ok(Json(detail(&state.db, film).await?))
}

async fn write_film(
    state: &AppState,
    id: i32,
    payload: FilmPayload,
    mode: WriteMode,
) -> Result<Json<FilmDetail>, AppError> {
    let film = Films::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("film"))?;
    validate(&state.db, &payload, mode).await?;

    let mut active: films::ActiveModel = film.into();
    if let Some(Some(title)) = payload.title.clone() {
        active.title = Set(title);
    }
    if let Some(Some(original_title)) = payload.original_title.clone() {
        active.original_title = Set(original_title);
    }
    if let Some(Some(tagline)) = payload.tagline.clone() {
        active.tagline = Set(tagline);
    }
    if let Some(Some(year)) = payload.year {
        active.year = Set(year);
    }
    if let Some(Some(description)) = payload.description.clone() {
        active.description = Set(description);
    }
    if let Some(duration) = payload.duration {
        active.duration = Set(duration);
    }
    if let Some(poster) = payload.poster.clone() {
        active.poster = Set(poster);
    }
    if let Some(background) = payload.background.clone() {
        active.background = Set(background);
    }
    if let Some(Some(trailer_url)) = payload.trailer_url.clone() {
        active.trailer_url = Set(trailer_url);
    }
    if let Some(release_date) = payload.release_date {
        active.release_date = Set(release_date);
    }
    active.updated_at = Set(Utc::now());

    let txn = state.db.begin().await?;
    let film = active.update(&txn).await?;
    write_links(&txn, film.id, &payload).await?;
    txn.commit().await?;

    Ok(Json(detail(&state.db, film).await?))
}

#[utoipa::path(
    put,
    path = "/films/{id}/",
    params(("id" = i32, Path, description = "Film id")),
    request_body = FilmPayload,
    responses(
        (status = 200, description = "Film replaced", body = FilmDetail),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "films"
)]
pub async fn update_film(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<FilmPayload>,
) -> Result<Json<FilmDetail>, AppError> {
    write_film(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/films/{id}/",
    params(("id" = i32, Path, description = "Film id")),
    request_body = FilmPayload,
    responses(
        (status = 200, description = "Film updated", body = FilmDetail),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "films"
)]
pub async fn partial_update_film(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<FilmPayload>,
) -> Result<Json<FilmDetail>, AppError> {
    write_film(&state, id, payload, WriteMode::Partial).await
}

#[utoipa::path(
    delete,
    path = "/films/{id}/",
    params(("id" = i32, Path, description = "Film id")),
    responses(
        (status = 204, description = "Film deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "films"
)]
pub async fn delete_film(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let film = Films::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("film"))?;

    replace_links::<FilmGenres, _>(&txn, film_genres::Column::FilmId, film.id, Vec::new()).await?;
    replace_links::<FilmThemes, _>(&txn, film_themes::Column::FilmId, film.id, Vec::new()).await?;
    replace_links::<FilmStudios, _>(&txn, film_studios::Column::FilmId, film.id, Vec::new())
        .await?;
    replace_links::<FilmCountries, _>(&txn, film_countries::Column::FilmId, film.id, Vec::new())
        .await?;
    replace_links::<FilmLanguages, _>(&txn, film_languages::Column::FilmId, film.id, Vec::new())
        .await?;
    film.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!("🗑️ Film {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
