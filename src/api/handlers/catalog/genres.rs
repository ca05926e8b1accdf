use super::{check_unique, not_found};
use crate::api::payload::{WriteMode, field_errors, given, not_null, require_text};
use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, exact_str, order, search_condition};
use crate::entities::{film_genres, genres, prelude::*};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenrePayload {
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    payload: &GenrePayload,
    mode: WriteMode,
    existing: Option<i32>,
) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    not_null(&mut errors, "description", &payload.description);
    require_text(&mut errors, mode, "name", &payload.name);
    check_unique::<Genres, _>(
        db,
        &mut errors,
        "genre",
        "name",
        genres::Column::Name,
        given(&payload.name),
        genres::Column::Id,
        existing,
    )
    .await?;
    errors.into_result()
}

#[utoipa::path(
    get,
    path = "/genres/",
    params(
        ("name" = Option<String>, Query, description = "Exact name"),
        ("search" = Option<String>, Query, description = "Terms matched against name and description"),
        ("ordering" = Option<String>, Query, description = "id, name; prefix with - for descending")
    ),
    responses((status = 200, description = "All genres", body = [Genre])),
    tag = "genres"
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<genres::Model>>, AppError> {
    let mut select = Genres::find();
    if let Some(name) = exact_str(&params, "name") {
        select = select.filter(genres::Column::Name.eq(name));
    }
    if let Some(cond) =
        search_condition(&params, &[genres::Column::Name, genres::Column::Description])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[("id", genres::Column::Id), ("name", genres::Column::Name)],
        genres::Column::Id,
    );

    Ok(Json(select.all(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/genres/",
    request_body = GenrePayload,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "genres"
)]
pub async fn create_genre(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<GenrePayload>,
) -> Result<(StatusCode, Json<genres::Model>), AppError> {
    validate(&state.db, &payload, WriteMode::Create, None).await?;

    let genre = genres::ActiveModel {
        name: Set(payload.name.flatten().unwrap_or_default()),
        description: Set(payload.description.flatten().unwrap_or_default()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!("🎭 Genre {} created", genre.name);
    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    get,
    path = "/genres/{id}/",
    params(("id" = i32, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Not found")
    ),
    tag = "genres"
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<genres::Model>, AppError> {
    Genres::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("genre"))
}

async fn write_genre(
    state: &AppState,
    id: i32,
    payload: GenrePayload,
    mode: WriteMode,
) -> Result<Json<genres::Model>, AppError> {
    let genre = Genres::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("genre"))?;
    validate(&state.db, &payload, mode, Some(id)).await?;

    let mut active: genres::ActiveModel = genre.clone().into();
    if let Some(Some(name)) = payload.name {
        active.name = Set(name);
    }
    if let Some(Some(description)) = payload.description {
        active.description = Set(description);
    }

    if !active.is_changed() {
        return Ok(Json(genre));
    }
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/genres/{id}/",
    params(("id" = i32, Path, description = "Genre id")),
    request_body = GenrePayload,
    responses(
        (status = 200, description = "Genre replaced", body = Genre),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "genres"
)]
pub async fn update_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<GenrePayload>,
) -> Result<Json<genres::Model>, AppError> {
    write_genre(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/genres/{id}/",
    params(("id" = i32, Path, description = "Genre id")),
    request_body = GenrePayload,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "genres"
)]
pub async fn partial_update_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<GenrePayload>,
) -> Result<Json<genres::Model>, AppError> {
    write_genre(&state, id, payload, WriteMode::Partial).await
}

#[utoipa::path(
    delete,
    path = "/genres/{id}/",
    params(("id" = i32, Path, description = "Genre id")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "genres"
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let genre = Genres::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("genre"))?;

    FilmGenres::delete_many()
        .filter(film_genres::Column::GenreId.eq(genre.id))
        .exec(&txn)
        .await?;
    genre.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!("🗑️ Genre {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
