//! Public profiles, the caller's own profile, the staff user directory and
//! role assignment.

use crate::AppState;
use crate::api::error::{AppError, FieldErrors};
use crate::api::extract::{JsonBody, Path, Query, nullable};
use crate::api::filters::{Params, exact_str, order, search_condition};
use crate::api::middleware::auth::AuthUser;
use crate::api::payload::{NULL, REQUIRED, blank_or_url, given_str, not_null};
use crate::entities::{
    prelude::*,
    users::{self, Role},
};
use crate::services::account_service::AccountService;
use crate::services::follow_service::{FollowCounts, FollowService};
use axum::{
    Extension, Json,
    extract::State,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPublic {
    pub id: i32,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub social: String,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPrivate {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: String,
    pub social: String,
    pub role: Role,
    pub followers_count: u64,
    pub following_count: u64,
}

impl UserPublic {
    fn new(user: users::Model, counts: FollowCounts) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar: user.avatar,
            bio: user.bio,
            social: user.social,
            followers_count: counts.followers,
            following_count: counts.following,
        }
    }
}

impl UserPrivate {
    fn new(user: users::Model, counts: FollowCounts) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            bio: user.bio,
            social: user.social,
            role: user.role,
            followers_count: counts.followers,
            following_count: counts.following,
        }
    }
}

/// Serializes users with follow counts read at call time.
async fn with_counts<C, T>(
    db: &C,
    users: Vec<users::Model>,
    shape: fn(users::Model, FollowCounts) -> T,
) -> Result<Vec<T>, AppError>
where
    C: ConnectionTrait,
{
    let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
    let counts = FollowService::counts(db, &ids).await?;
    Ok(users
        .into_iter()
        .map(|u| {
            let c = counts.get(&u.id).copied().unwrap_or_default();
            shape(u, c)
        })
        .collect())
}

pub async fn public_profiles<C: ConnectionTrait>(
    db: &C,
    users: Vec<users::Model>,
) -> Result<Vec<UserPublic>, AppError> {
    with_counts(db, users, UserPublic::new).await
}

async fn private_profile<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
) -> Result<UserPrivate, AppError> {
    let counts = FollowService::counts(db, &[user.id]).await?;
    let c = counts.get(&user.id).copied().unwrap_or_default();
    Ok(UserPrivate::new(user, c))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<users::Model, AppError> {
    Users::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("No user matches the given query.".to_string()))
}

#[utoipa::path(
    get,
    path = "/users/",
    responses((status = 200, description = "All users", body = [UserPublic])),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserPublic>>, AppError> {
    let users = Users::find()
        .order_by_asc(users::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(public_profiles(&state.db, users).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = UserPublic),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserPublic>, AppError> {
    let user = find_user(&state.db, id).await?;
    let mut shaped = public_profiles(&state.db, vec![user]).await?;
    shaped
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("user vanished while serializing".to_string()))
}

#[utoipa::path(
    get,
    path = "/profile/",
    responses(
        (status = 200, description = "The caller's profile", body = UserPrivate),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserPrivate>, AppError> {
    let user = find_user(&state.db, user.id).await?;
    Ok(Json(private_profile(&state.db, user).await?))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileEditRequest {
    /// Path of the avatar image; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, nullable)]
    pub avatar: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    /// Link to a social profile; must be a URL or blank.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub social: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileEditResponse {
    pub avatar: Option<String>,
    pub bio: String,
    pub social: String,
}

/// Updates avatar, bio and social of the caller. Nothing else on the account
/// can be changed here.
#[utoipa::path(
    patch,
    path = "/profile/edit/",
    request_body = ProfileEditRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileEditResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn edit_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<ProfileEditRequest>,
) -> Result<Json<ProfileEditResponse>, AppError> {
    let mut errors = FieldErrors::new();
    not_null(&mut errors, "bio", &payload.bio);
    not_null(&mut errors, "social", &payload.social);
    blank_or_url(&mut errors, "social", given_str(&payload.social));
    errors.into_result()?;

    let current = find_user(&state.db, user.id).await?;
    let mut active: users::ActiveModel = current.clone().into();
    if let Some(avatar) = payload.avatar {
        active.avatar = Set(avatar);
    }
    if let Some(Some(bio)) = payload.bio {
        active.bio = Set(bio);
    }
    if let Some(Some(social)) = payload.social {
        active.social = Set(social);
    }

    let saved = if active.is_changed() {
        active.update(&state.db).await?
    } else {
        current
    };

    Ok(Json(ProfileEditResponse {
        avatar: saved.avatar,
        bio: saved.bio,
        social: saved.social,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleRequest {
    /// One of `admin`, `staff`, `user`.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub role: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleResponse {
    pub role: Role,
}

#[utoipa::path(
    patch,
    path = "/users/{id}/set-role/",
    params(("id" = i32, Path, description = "User id")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role changed", body = RoleResponse),
        (status = 400, description = "Invalid role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn set_role(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(payload): JsonBody<RoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let target = find_user(&state.db, id).await?;

    let role = match payload.role.as_ref() {
        None => return Err(AppError::Validation(FieldErrors::single("role", REQUIRED))),
        Some(None) => return Err(AppError::Validation(FieldErrors::single("role", NULL))),
        Some(Some(raw)) => raw
            .parse::<Role>()
            .map_err(|e| AppError::Validation(FieldErrors::single("role", e)))?,
    };

    let updated = if target.role == role {
        target
    } else {
        AccountService::set_role(&state.db, target, role).await?
    };
    Ok(Json(RoleResponse { role: updated.role }))
}

#[utoipa::path(
    get,
    path = "/admin/users/",
    params(
        ("role" = Option<String>, Query, description = "admin, staff or user"),
        ("search" = Option<String>, Query, description = "Terms matched against username and email"),
        ("ordering" = Option<String>, Query, description = "id, username, role; prefix with - for descending")
    ),
    responses(
        (status = 200, description = "Private user records", body = [UserPrivate]),
        (status = 400, description = "Invalid role filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn list_private_users(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Vec<UserPrivate>>, AppError> {
    let mut select = Users::find();
    if let Some(raw) = exact_str(&params, "role") {
        let role = raw.parse::<Role>().map_err(|_| {
            AppError::Validation(FieldErrors::single(
                "role",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    raw
                ),
            ))
        })?;
        select = select.filter(users::Column::Role.eq(role));
    }
    if let Some(cond) =
        search_condition(&params, &[users::Column::Username, users::Column::Email])
    {
        select = select.filter(cond);
    }
    let select = order(
        select,
        &params,
        &[
            ("id", users::Column::Id),
            ("username", users::Column::Username),
            ("role", users::Column::Role),
        ],
        users::Column::Id,
    );

    let users = select.all(&state.db).await?;
    Ok(Json(with_counts(&state.db, users, UserPrivate::new).await?))
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Private user record", body = UserPrivate),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn get_private_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserPrivate>, AppError> {
    let user = find_user(&state.db, id).await?;
    Ok(Json(private_profile(&state.db, user).await?))
}
