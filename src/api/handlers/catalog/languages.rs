use super::{check_unique, not_found};
use crate::api::payload::{WriteMode, field_errors, given, require_text};
use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, exact_str, order, search_condition};
use crate::entities::{film_languages, languages, prelude::*};
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
pub struct LanguagePayload {
    #[validate(length(max = 50, message = "Ensure this field has no more than 50 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[validate(length(max = 10, message = "Ensure this field has no more than 10 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub code: Option<Option<String>>,
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    payload: &LanguagePayload,
    mode: WriteMode,
    existing: Option<i32>,
) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    require_text(&mut errors, mode, "name", &payload.name);
    require_text(&mut errors, mode, "code", &payload.code);

    for (field, column, value) in [
        ("name", languages::Column::Name, given(&payload.name)),
        ("code", languages::Column::Code, given(&payload.code)),
    ] {
        check_unique::<Languages, _>(
            db,
            &mut errors,
            "language",
            field,
            column,
            value,
            languages::Column::Id,
            existing,
        )
        .await?;
    }

    errors.into_result()
}

#[utoipa::path(
    get,
    path = "/languages/",
    params(
        ("name" = Option<String>, Query, description = "Exact name"),
        ("code" = Option<String>, Query, description = "Exact code"),
        ("search" = Option<String>, Query, description = "Terms matched against name and code"),
        ("ordering" = Option<String>, Query, description = "id, name, code; prefix with - for descending")
    ),
    responses((status = 200, description = "All languages", body = [Language])),
    tag = "languages"
)]
pub async fn list_languages(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<languages::Model>>, AppError> {
    let mut select = Languages::find();
    if let Some(name) = exact_str(&params, "name") {
        select = select.filter(languages::Column::Name.eq(name));
    }
    if let Some(code) = exact_str(&params, "code") {
        select = select.filter(languages::Column::Code.eq(code));
    }
    if let Some(cond) =
        search_condition(&params, &[languages::Column::Name, languages::Column::Code])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[
            ("id", languages::Column::Id),
            ("name", languages::Column::Name),
            ("code", languages::Column::Code),
        ],
        languages::Column::Id,
    );

    Ok(Json(select.all(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/languages/",
    request_body = LanguagePayload,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "languages"
)]
pub async fn create_language(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LanguagePayload>,
) -> Result<(StatusCode, Json<languages::Model>), AppError> {
    validate(&state.db, &payload, WriteMode::Create, None).await?;

    let language = languages::ActiveModel {
        name: Set(payload.name.flatten().unwrap_or_default()),
        code: Set(payload.code.flatten().unwrap_or_default()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(language)))
}

#[utoipa::path(
    get,
    path = "/languages/{id}/",
    params(("id" = i32, Path, description = "Language id")),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Not found")
    ),
    tag = "languages"
)]
pub async fn get_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<languages::Model>, AppError> {
    Languages::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("language"))
}

async fn write_language(
    state: &AppState,
    id: i32,
    payload: LanguagePayload,
    mode: WriteMode,
) -> Result<Json<languages::Model>, AppError> {
    let language = Languages::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("language"))?;
    validate(&state.db, &payload, mode, Some(id)).await?;

    let mut active: languages::ActiveModel = language.clone().into();
    if let Some(Some(name)) = payload.name {
        active.name = Set(name);
    }
    if let Some(Some(code)) = payload.code {
        active.code = Set(code);
    }

    if !active.is_changed() {
        return Ok(Json(language));
    }
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/languages/{id}/",
    params(("id" = i32, Path, description = "Language id")),
    request_body = LanguagePayload,
    responses(
        (status = 200, description = "Language replaced", body = Language),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "languages"
)]
pub async fn update_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<LanguagePayload>,
) -> Result<Json<languages::Model>, AppError> {
    write_language(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/languages/{id}/",
    params(("id" = i32, Path, description = "Language id")),
    request_body = LanguagePayload,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "languages"
)]
pub async fn partial_update_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<LanguagePayload>,
) -> Result<Json<languages::Model>, AppError> {
    write_language(&state, id, payload, WriteMode::Partial).await
}

#[utoipa::path(
    delete,
    path = "/languages/{id}/",
    params(("id" = i32, Path, description = "Language id")),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "languages"
)]
pub async fn delete_language(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let language = Languages::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("language"))?;

    FilmLanguages::delete_many()
        .filter(film_languages::Column::LanguageId.eq(language.id))
        .exec(&txn)
        .await?;
    language.delete(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
