use super::{check_unique, not_found};
use crate::api::payload::{WriteMode, field_errors, given, not_null, require_text};
use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, exact_str, order, search_condition};
use crate::entities::{film_themes, themes, prelude::*};
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
pub struct ThemePayload {
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
    payload: &ThemePayload,
    mode: WriteMode,
    existing: Option<i32>,
) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    not_null(&mut errors, "description", &payload.description);
    require_text(&mut errors, mode, "name", &payload.name);
    check_unique::<Themes, _>(
        db,
        &mut errors,
        "theme",
        "name",
        themes::Column::Name,
        given(&payload.name),
        themes::Column::Id,
        existing,
    )
    .await?;
    errors.into_result()
}

#[utoipa::path(
    get,
    path = "/themes/",
    params(
        ("name" = Option<String>, Query, description = "Exact name"),
        ("search" = Option<String>, Query, description = "Terms matched against name and description"),
        ("ordering" = Option<String>, Query, description = "id, name; prefix with - for descending")
    ),
    responses((status = 200, description = "All themes", body = [Theme])),
    tag = "themes"
)]
pub async fn list_themes(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<themes::Model>>, AppError> {
    let mut select = Themes::find();
    if let Some(name) = exact_str(&params, "name") {
        select = select.filter(themes::Column::Name.eq(name));
    }
    if let Some(cond) =
        search_condition(&params, &[themes::Column::Name, themes::Column::Description])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[("id", themes::Column::Id), ("name", themes::Column::Name)],
        themes::Column::Id,
    );

    Ok(Json(select.all(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/themes/",
    request_body = ThemePayload,
    responses(
        (status = 201, description = "Theme created", body = Theme),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "themes"
)]
pub async fn create_theme(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ThemePayload>,
) -> Result<(StatusCode, Json<themes::Model>), AppError> {
    validate(&state.db, &payload, WriteMode::Create, None).await?;

    let theme = themes::ActiveModel {
        name: Set(payload.name.flatten().unwrap_or_default()),
        description: Set(payload.description.flatten().unwrap_or_default()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!("🧩 Theme {} created", theme.name);
    Ok((StatusCode::CREATED, Json(theme)))
}

#[utoipa::path(
    get,
    path = "/themes/{id}/",
    params(("id" = i32, Path, description = "Theme id")),
    responses(
        (status = 200, description = "Theme", body = Theme),
        (status = 404, description = "Not found")
    ),
    tag = "themes"
)]
pub async fn get_theme(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<themes::Model>, AppError> {
    Themes::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("theme"))
}

async fn write_theme(
    state: &AppState,
    id: i32,
    payload: ThemePayload,
    mode: WriteMode,
) -> Result<Json<themes::Model>, AppError> {
    let theme = Themes::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("theme"))?;
    validate(&state.db, &payload, mode, Some(id)).await?;

    let mut active: themes::ActiveModel = theme.clone().into();
    if let Some(Some(name)) = payload.name {
        active.name = Set(name);
    }
    if let Some(Some(description)) = payload.description {
        active.description = Set(description);
    }

    if !active.is_changed() {
        return Ok(Json(theme));
    }
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/themes/{id}/",
    params(("id" = i32, Path, description = "Theme id")),
    request_body = ThemePayload,
    responses(
        (status = 200, description = "Theme replaced", body = Theme),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "themes"
)]
pub async fn update_theme(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<ThemePayload>,
) -> Result<Json<themes::Model>, AppError> {
    write_theme(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/themes/{id}/",
    params(("id" = i32, Path, description = "Theme id")),
    request_body = ThemePayload,
    responses(
        (status = 200, description = "Theme updated", body = Theme),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "themes"
)]
pub async fn partial_update_theme(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<ThemePayload>,
) -> Result<Json<themes::Model>, AppError> {
    write_theme(&state, id, payload, WriteMode::Partial).await
}

#[utoipa::path(
    delete,
    path = "/themes/{id}/",
    params(("id" = i32, Path, description = "Theme id")),
    responses(
        (status = 204, description = "Theme deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "themes"
)]
pub async fn delete_theme(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let theme = Themes::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("theme"))?;

    FilmThemes::delete_many()
        .filter(film_themes::Column::ThemeId.eq(theme.id))
        .exec(&txn)
        .await?;
    theme.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!("🗑️ Theme {} deleted", id);
    Ok(StatusCode::NO_CONTENT)
}
