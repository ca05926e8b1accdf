use super::users::{UserPublic, public_profiles};
use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::Path;
use crate::api::middleware::auth::AuthUser;
use crate::services::follow_service::FollowService;
use axum::{Extension, Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowResponse {
    pub detail: String,
}

#[utoipa::path(
    post,
    path = "/users/{id}/follow/",
    params(("id" = i32, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Now following", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "follows"
)]
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<FollowResponse>, AppError> {
    let target = FollowService::follow(&state.db, user.id, id).await?;
    Ok(Json(FollowResponse {
        detail: format!("You are now following {}.", target.username),
    }))
}

#[utoipa::path(
    post,
    path = "/users/{id}/unfollow/",
    params(("id" = i32, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "No longer following", body = FollowResponse),
        (status = 400, description = "Cannot unfollow yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("jwt" = [])),
    tag = "follows"
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<FollowResponse>, AppError> {
    let target = FollowService::unfollow(&state.db, user.id, id).await?;
    Ok(Json(FollowResponse {
        detail: format!("You have unfollowed {}.", target.username),
    }))
}

#[utoipa::path(
    get,
    path = "/users/{id}/followers/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Users following this user", body = [UserPublic]),
        (status = 404, description = "User not found")
    ),
    tag = "follows"
)]
pub async fn user_followers(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    let users = FollowService::followers(&state.db, id).await?;
    Ok(Json(public_profiles(&state.db, users).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}/following/",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "Users this user follows", body = [UserPublic]),
        (status = 404, description = "User not found")
    ),
    tag = "follows"
)]
pub async fn user_following(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    let users = FollowService::following(&state.db, id).await?;
    Ok(Json(public_profiles(&state.db, users).await?))
}
