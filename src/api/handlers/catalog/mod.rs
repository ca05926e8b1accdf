//! Catalog CRUD handlers and the database-side checks they share.
//!
//! Reads are public. Writes sit behind `require_admin_or_staff` in the router.

pub mod countries;
pub mod films;
pub mod genres;
pub mod languages;
pub mod studios;
pub mod themes;

use crate::api::error::{AppError, FieldErrors};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect,
};

/// Whether another row already holds `value` in a unique column.
pub async fn is_taken<E, C>(
    db: &C,
    column: E::Column,
    value: &str,
    id_column: E::Column,
    exclude_id: Option<i32>,
) -> Result<bool, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query = E::find().filter(column.eq(value));
    if let Some(id) = exclude_id {
        query = query.filter(id_column.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

/// Records "already exists" on `field` when `value` is set and taken.
#[allow(clippy::too_many_arguments)]
pub async fn check_unique<E, C>(
    db: &C,
    errors: &mut FieldErrors,
    label: &str,
    field: &str,
    column: E::Column,
    value: Option<&String>,
    id_column: E::Column,
    exclude_id: Option<i32>,
) -> Result<(), AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if let Some(value) = value
        && is_taken::<E, C>(db, column, value, id_column, exclude_id).await?
    {
        errors.add(field, format!("{} with this {} already exists.", label, field));
    }
    Ok(())
}

/// Ids from `ids` that have no row in `E`, in request order.
pub async fn missing_ids<E, C>(
    db: &C,
    id_column: E::Column,
    ids: &[i32],
) -> Result<Vec<i32>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let found: Vec<i32> = E::find()
        .select_only()
        .column(id_column)
        .filter(id_column.is_in(ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// Records one message per unknown primary key referenced by `field`.
pub async fn check_references<E, C>(
    db: &C,
    errors: &mut FieldErrors,
    field: &str,
    id_column: E::Column,
    ids: &[i32],
) -> Result<(), AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    for id in missing_ids::<E, C>(db, id_column, ids).await? {
        errors.add(field, format!("Invalid pk \"{}\" - object does not exist.", id));
    }
    Ok(())
}

/// Records an invalid choice on `field` for the first of `ids` with no row in `E`.
pub async fn check_choices<E, C>(
    db: &C,
    errors: &mut FieldErrors,
    field: &str,
    id_column: E::Column,
    ids: &[i32],
) -> Result<(), AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if let Some(id) = missing_ids::<E, C>(db, id_column, ids).await?.first() {
        errors.add(
            field,
            format!("Select a valid choice. {} is not one of the available choices.", id),
        );
    }
    Ok(())
}

/// Replaces every join row of `owner_id` with `rows`.
pub async fn replace_links<J, C>(
    db: &C,
    owner_column: J::Column,
    owner_id: i32,
    rows: Vec<J::ActiveModel>,
) -> Result<(), AppError>
where
    J: EntityTrait,
    J::Model: IntoActiveModel<J::ActiveModel>,
    C: ConnectionTrait,
{
    J::delete_many()
        .filter(owner_column.eq(owner_id))
        .exec(db)
        .await?;

    if !rows.is_empty() {
        J::insert_many(rows).exec_without_returning(db).await?;
    }
    Ok(())
}

/// Removes duplicates while keeping the first occurrence of each id.
pub fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}

pub fn not_found(label: &str) -> AppError {
    AppError::NotFound(format!("No {} matches the given query.", label))
}
