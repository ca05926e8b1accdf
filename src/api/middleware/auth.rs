use crate::api::error::AppError;
use crate::api::permissions::{Action, Caller, authorize};
use crate::entities::{prelude::Users, users::Role};
use crate::utils::auth::{TokenType, validate_jwt};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;

/// The authenticated caller, inserted into request extensions by the guards below.
/// The role is read from the database on every request, never from the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller::Authenticated(self.role)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `Ok(None)` when no credentials were sent. A token that was sent but does not
/// resolve to an active user is an authentication failure.
pub async fn resolve_user(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    let claims = validate_jwt(token, &state.config.jwt_secret, TokenType::Access).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        AppError::Unauthorized("Given token not valid for any token type".to_string())
    })?;

    let user = Users::find_by_id(claims.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if !user.is_active {
        return Err(AppError::Unauthorized("User is inactive".to_string()));
    }

    Ok(Some(AuthUser {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}

async fn guard(
    state: &AppState,
    action: Action,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(state, req.headers()).await?;
    let caller = user
        .as_ref()
        .map(AuthUser::caller)
        .unwrap_or(Caller::Anonymous);

    authorize(caller, action)?;

    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }
    Ok(next.run(req).await)
}

/// Any authenticated, active user.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Action::UseAccount, req, next).await
}

/// Catalog writes.
pub async fn require_admin_or_staff(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Action::ManageCatalog, req, next).await
}

pub async fn require_user_directory(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Action::ViewUserDirectory, req, next).await
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, Action::AssignRoles, req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
