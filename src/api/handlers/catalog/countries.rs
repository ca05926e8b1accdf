use super::{check_unique, not_found};
use crate::api::payload::{WriteMode, field_errors, given, require_text};
use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, exact_str, order, search_condition};
use crate::entities::{countries, film_countries, prelude::*, studios};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait, sea_query::Expr,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CountryPayload {
    #[validate(length(max = 60, message = "Ensure this field has no more than 60 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,
    #[validate(length(max = 4, message = "Ensure this field has no more than 4 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub code: Option<Option<String>>,
    /// Path of the flag image; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub flag: Option<Option<String>>,
}

async fn validate<C: ConnectionTrait>(
    db: &C,
    payload: &CountryPayload,
    mode: WriteMode,
    existing: Option<i32>,
) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    require_text(&mut errors, mode, "name", &payload.name);
    require_text(&mut errors, mode, "code", &payload.code);

    check_unique::<Countries, _>(
        db,
        &mut errors,
        "country",
        "name",
        countries::Column::Name,
        given(&payload.name),
        countries::Column::Id,
        existing,
    )
    .await?;
    check_unique::<Countries, _>(
        db,
        &mut errors,
        "country",
        "code",
        countries::Column::Code,
        given(&payload.code),
        countries::Column::Id,
        existing,
    )
    .await?;

    errors.into_result()
}

#[utoipa::path(
    get,
    path = "/countries/",
    params(
        ("name" = Option<String>, Query, description = "Exact name"),
        ("code" = Option<String>, Query, description = "Exact code"),
        ("search" = Option<String>, Query, description = "Terms matched against name and code"),
        ("ordering" = Option<String>, Query, description = "id, name, code; prefix with - for descending")
    ),
    responses((status = 200, description = "All countries", body = [Country])),
    tag = "countries"
)]
pub async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<countries::Model>>, AppError> {
    let mut select = Countries::find();
    if let Some(name) = exact_str(&params, "name") {
        select = select.filter(countries::Column::Name.eq(name));
    }
    if let Some(code) = exact_str(&params, "code") {
        select = select.filter(countries::Column::Code.eq(code));
    }
    if let Some(cond) =
        search_condition(&params, &[countries::Column::Name, countries::Column::Code])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[
            ("id", countries::Column::Id),
            ("name", countries::Column::Name),
            ("code", countries::Column::Code),
        ],
        countries::Column::Id,
    );

    Ok(Json(select.all(&state.db).await?))
}

#[utoipa::path(
    post,
    path = "/countries/",
    request_body = CountryPayload,
    responses(
        (status = 201, description = "Country created", body = Country),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "countries"
)]
pub async fn create_country(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CountryPayload>,
) -> Result<(StatusCode, Json<countries::Model>), AppError> {
    validate(&state.db, &payload, WriteMode::Create, None).await?;

    let country = countries::ActiveModel {
        name: Set(payload.name.flatten().unwrap_or_default()),
        code: Set(payload.code.flatten().unwrap_or_default()),
        flag: Set(payload.flag.flatten()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!("🌍 Country {} ({}) created", country.name, country.code);
    Ok((StatusCode::CREATED, Json(country)))
}

#[utoipa::path(
    get,
    path = "/countries/{id}/",
    params(("id" = i32, Path, description = "Country id")),
    responses(
        (status = 200, description = "Country", body = Country),
        (status = 404, description = "Not found")
    ),
    tag = "countries"
)]
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<countries::Model>, AppError> {
    Countries::find_by_id(id)
        .one(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| not_found("country"))
}

async fn write_country(
    state: &AppState,
    id: i32,
    payload: CountryPayload,
    mode: WriteMode,
) -> Result<Json<countries::Model>, AppError> {
    let country = Countries::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found("country"))?;
    validate(&state.db, &payload, mode, Some(id)).await?;

    let mut active: countries::ActiveModel = country.clone().into();
    if let Some(Some(name)) = payload.name {
        active.name = Set(name);
    }
    if let Some(Some(code)) = payload.code {
        active.code = Set(code);
    }
    if let Some(flag) = payload.flag {
        active.flag = Set(flag);
    }

    if !active.is_changed() {
        return Ok(Json(country));
    }
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    put,
    path = "/countries/{id}/",
    params(("id" = i32, Path, description = "Country id")),
    request_body = CountryPayload,
    responses(
        (status = 200, description = "Country replaced", body = Country),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "countries"
)]
pub async fn update_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<CountryPayload>,
) -> Result<Json<countries::Model>, AppError> {
    write_country(&state, id, payload, WriteMode::Replace).await
}

#[utoipa::path(
    patch,
    path = "/countries/{id}/",
    params(("id" = i32, Path, description = "Country id")),
    request_body = CountryPayload,
    responses(
        (status = 200, description = "Country updated", body = Country),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "countries"
)]
pub async fn partial_update_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<CountryPayload>,
) -> Result<Json<countries::Model>, AppError> {
    write_country(&state, id, payload, WriteMode::Partial).await
}

/// Studios of the deleted country keep existing with no country.
#[utoipa::path(
    delete,
    path = "/countries/{id}/",
    params(("id" = i32, Path, description = "Country id")),
    responses(
        (status = 204, description = "Country deleted"),
        (status = 404, description = "Not found")
    ),
    security(("jwt" = [])),
    tag = "countries"
)]
pub async fn delete_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;
    let country = Countries::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found("country"))?;

    let orphaned = Studios::update_many()
        .col_expr(studios::Column::CountryId, Expr::value(Option::<i32>::None))
        .filter(studios::Column::CountryId.eq(country.id))
        .exec(&txn)
        .await?;
    FilmCountries::delete_many()
        .filter(film_countries::Column::CountryId.eq(country.id))
        .exec(&txn)
        .await?;
    country.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        "🗑️ Country {} deleted, {} studio(s) detached",
        id,
        orphaned.rows_affected
    );
    Ok(StatusCode::NO_CONTENT)
}
