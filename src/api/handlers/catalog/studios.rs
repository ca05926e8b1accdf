use super::{check_references, check_unique, missing_ids, not_found};
use crate::api::payload::{WriteMode, field_errors, given, non_negative, not_null, require_text};
use crate::AppState;
use crate::api::error::{AppError, FieldErrors};
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{
    INVALID_CHOICE, Params, choice_id, exact_int, exact_str, order, search_condition,
};
use crate::entities::{countries, film_studios, prelude::*, studios};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

/// Studio as read: the country is nested, not referenced by id.
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = Studio)]
pub struct StudioResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub founded_year: Option<i32>,
    #[schema(value_type = Option<Country>)]
    pub country: Option<countries::Model>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StudioPayload {
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>, nullable)]
    pub founded_year: Option<Option<i32>>,
    /// Country id; `null` detaches the studio from its country.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>, nullable)]
    pub country_id: Option<Option<i32>>,
}

/// Pairs each studio with its country using one extra query.
pub async fn with_countries<C: ConnectionTrait>(
    db: &C,
    studios: Vec<studios::Model>,
) -> Result<Vec<StudioResponse>, AppError> {
    let mut country_ids: Vec<i32> = studios.iter().filter_map(|s| s.country_id).collect();
    country_ids.sort_unstable();
    country_ids.dedup();

    let countries: HashMap<i32, countries::Model> = if country_ids.is_empty() {
        HashMap::new()
    } else {
        Countries::find()
            .filter(countries::Column::Id.is_in(country_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    Ok(studios
        .into_iter()
        .map(|s| StudioResponse {
            country: s.country_id.and_then(|id| countries.get(&id).cloned()),
            id: s.id,
            name: s.name,
            description: s.description,
            founded_year: s.founded_year,
        })
        .collect())
}

async fn single<C: ConnectionTrait>(
    db: &C,
    studio: studios::Model,
) -> Result<StudioResponse, AppError> {
    with_countries(db, vec![studio])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("studio vanished while serializing".to_string()))
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    payload: &StudioPayload,
    mode: WriteMode,
    existing: Option<i32>,
) -> Result<(), AppError> {
    let mut errors: FieldErrors = field_errors(payload);
    not_null(&mut errors, "description", &payload.description);
    require_text(&mut errors, mode, "name", &payload.name);
    non_negative(&mut errors, "founded_year", payload.founded_year.flatten());

    check_unique::<Studios, _>(
        db,
        &mut errors,
        "studio",
        "name",
        studios::Column::Name,
        given(&payload.name),
        studios::Column::Id,
        existing,
    )
    .await?;

    if let Some(Some(country_id)) = payload.country_id {
        check_references::<Countries, _>(
            db,
            &mut errors,
            "country_id",
            countries::Column::Id,
            &[country_id],
        )
        .await?;
    }

    errors.into_result()
}

#[utoipa::path(
    get,
    path = "/studios/",
    params(
        ("name" = Option<String>, Query, description = "Exact name"),
        ("founded_year" = Option<i32>, Query, description = "Exact founding year"),
        ("country" = Option<i32>, Query, description = "Country id"),
        ("search" = Option<String>, Query, description = "Terms matched against name and description"),
        ("ordering" = Option<String>, Query, description = "id, name, founded_year, country; prefix with - for descending")
    ),
    responses(
        (status = 200, description = "All studios", body = [Studio]),
        (status = 400, description = "Malformed or unknown filter value")
    ),
    tag = "studios"
)]
pub async fn list_studios(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<StudioResponse>>, AppError> {
    let mut errors = FieldErrors::new();
    let founded_year = exact_int(&params, "founded_year", &mut errors);
    let country = choice_id(&params, "country", &mut errors);
    if let Some(id) = country
        && !missing_ids::<Countries, _>(&state.db, countries::Column::Id, &[id])
            .await?
            .is_empty()
    {
        errors.add("country", INVALID_CHOICE);
    }
    errors.into_result()?;

    let mut select = Studios::find();
    if let Some(name) = exact_str(&params, "name") {
        select = select.filter(studios::Column::Name.eq(name));
    }
    if let Some(year) = founded_year {
        select = select.filter(studios::Column::FoundedYear.eq(year));
    }
    if let Some(country) = country {
        select = select.filter(studios::Column::CountryId.eq(country));
    }
    if let Some(cond) =
        search_condition(&params, &[studios::Column::Name, studios::Column::Description])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[
            ("id", studios::Column::Id),
            ("name", studios::Column::Name),
            ("founded_year", studios::Column::FoundedYear),
            ("country", studios::Column::CountryId),
        ],
        studios::Column::Id,
    );

    let rows = select.all(&state.db).await?;
    Ok(Json(with_countries(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/studios/",
    request_body = StudioPayload,
    responses(
        (status = 201, description = "Studio created", body = Studio),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "studios"
)]
pub async fn create_studio(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<StudioPayload>,
) -> Result<(StatusCode, Json<StudioResponse>), AppError> {
    validate(&state.db, &payload, WriteMode::Create, None).await?;

    let studio = studios::ActiveModel {
        name: Set(payload.name.flatten().unwrap_or_default()),
        description: Set(payload.description.flatten().unwrap_or_default()),
        founded_year: Set(payload.founded_year.flatten()),
        country_id: Set(payload.country_id.flatten()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!("🎬 Studio {} created", studio.name);
    Ok((StatusCode::CREATED, Json(single(&state.db, studio).await?)))
}

#[utoipa::path(
    get,
    path = "/studios/{id}/",
    params(("id" = i32, Path, description = "Studio id")),
    responses(
        (status = 200, description = "Studio", body = Studio),
        (status = 404, description = "Not found")
    ),
    tag = "studios"
)]
pub async fn get_studio(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StudioResponse>, AppError> {
    let studio = Studios::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("studio"))?;
    Ok(Json(single(&state.db, studio).await?))
}

async fn write_studio(
    state: &AppState,
    id: i32,
    payload: StudioPayload,
    mode: WriteMode,
) -> Result<Json<StudioResponse>, AppError> {
    let studio = Studios::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("studio"))?;
    validate(&state.db, &payload, mode, Some(id)).await?;

    let mut active: studios::ActiveModel = studio.clone().into();
    if let Some(Some(name)) = payload.name {
        active.name = Set(name);
    }
    if let Some(Some(description)) = payload.description {
        active.description = Set(description);
    }
    if let Some(founded_year) = payload.founded_year {
        active.founded_year = Set(founded_year);
    }
    if let Some(country_id) = payload.country_id {
        active.country_id = Set(country_id);
    }

    let saved = if active.is_changed() {
        active.update(&state.db).await?
    } else {
        studio
    };
    Ok(Json(single(&state.db, saved).await?))
}

#[utoipa::path(
    put,
    path = "/studios/{id}/",
    params(("id" = i32, Path, description = "Studio id")),
    request_body = StudioPayload,
    responses(
        (status = 200, description = "Studio replaced", body = Studio),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "studios"
)]
pub async fn update_studio(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<StudioPayload>,
) -> Result<Json<StudioResponse>, AppError> {
    write_studio(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/studios/{id}/",
    params(("id" = i32, Path, description = "Studio id")),
    request_body = StudioPayload,
    responses(
        (status = 200, description = "Studio updated", body = Studio),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "studios"
)]
pub async fn partial_update_studio(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<StudioPayload>,
) -> Result<Json<StudioResponse>, AppError> {
    write_studio(&state, id, payload, WriteMode::Partial).await
}

#[utoipa::path(
    delete,
    path = "/studios/{id}/",
    params(("id" = i32, Path, description = "Studio id")),
    responses(
        (status = 204, description = "Studio deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "studios"
)]
pub async fn delete_studio(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let studio = Studios::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("studio"))?;

    FilmStudios::delete_many()
        .filter(film_studios::Column::StudioId.eq(studio.id))
        .exec(&txn)
        .await?;
    studio.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!("🗑️ Studio {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
