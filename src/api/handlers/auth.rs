use crate::AppState;
use crate::api::error::{AppError, FieldErrors, NON_FIELD_ERRORS};
use crate::api::extract::{JsonBody, nullable};
use crate::api::payload::{WriteMode, field_errors, given_str, require_text};
use crate::api::permissions::{Caller, is_admin_or_staff};
use crate::entities::users::{self, Role};
use crate::services::account_service::{AccountService, NewUser};
use crate::services::token_service::{TokenPair, TokenService};
use crate::utils::validation::{password_problems, validate_username};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub username: Option<Option<String>>,
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[validate(length(max = 128, message = "Ensure this field has no more than 128 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub password: Option<Option<String>>,
    #[validate(length(max = 128, message = "Ensure this field has no more than 128 characters."))]
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub password2: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub password: Option<Option<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub refresh: Option<Option<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

/// Field checks for registration. Password confirmation is only compared once
/// every field passed on its own.
fn check_registration(payload: &RegisterRequest, min_password_length: usize) -> Result<(), AppError> {
    let mut errors = field_errors(payload);
    for (field, value) in [
        ("username", &payload.username),
        ("email", &payload.email),
        ("password", &payload.password),
        ("password2", &payload.password2),
    ] {
        require_text(&mut errors, WriteMode::Create, field, value);
    }

    if let Some(username) = given_str(&payload.username)
        && let Err(e) = validate_username(username)
    {
        errors.add("username", e.message.unwrap_or_default());
    }

    // Over-long values already failed their own field; they are not compared
    let attribute = |field: &str, value: &Option<Option<String>>| {
        if errors.get(field).is_none() {
            given_str(value).unwrap_or_default().to_string()
        } else {
            String::new()
        }
    };
    let username = attribute("username", &payload.username);
    let email = attribute("email", &payload.email);
    if let Some(password) = given_str(&payload.password)
        && errors.get("password").is_none()
    {
        for problem in password_problems(password, &username, &email, min_password_length) {
            errors.add("password", problem);
        }
    }
    errors.into_result()?;

    if payload.password != payload.password2 {
        return Err(AppError::Validation(FieldErrors::single(
            "password",
            "Passwords didn't match.",
        )));
    }
    Ok(())
}

fn credentials(payload: &LoginRequest) -> Result<(&str, &str), AppError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, WriteMode::Create, "username", &payload.username);
    require_text(&mut errors, WriteMode::Create, "password", &payload.password);
    errors.into_result()?;

    Ok((
        given_str(&payload.username).unwrap_or_default(),
        given_str(&payload.password).unwrap_or_default(),
    ))
}

#[utoipa::path(
    post,
    path = "/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Validation error")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    check_registration(&payload, state.config.min_password_length)?;

    let user = AccountService::create_user(
        &state.db,
        NewUser {
            username: given_str(&payload.username).unwrap_or_default(),
            email: given_str(&payload.email).unwrap_or_default(),
            password: given_str(&payload.password).unwrap_or_default(),
            role: Role::User,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let (username, password) = credentials(&payload)?;
    let user = AccountService::authenticate(&state.db, username, password).await?;
    issue(&state, &user).await
}

/// Login for the back office: only admin and staff accounts receive tokens.
#[utoipa::path(
    post,
    path = "/admin-login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Missing credentials or role not allowed"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn admin_login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, AppError> {
    let (username, password) = credentials(&payload)?;
    let user = AccountService::authenticate(&state.db, username, password).await?;

    if !is_admin_or_staff(Caller::Authenticated(user.role)) {
        tracing::warn!("⛔ Admin login refused for {} ({})", user.username, user.role);
        return Err(AppError::Validation(FieldErrors::single(
            NON_FIELD_ERRORS,
            "You are not authorized to access the admin panel.",
        )));
    }

    issue(&state, &user).await
}

async fn issue(state: &AppState, user: &users::Model) -> Result<Json<TokenPair>, AppError> {
    let pair = TokenService::issue_pair(&state.db, &state.config, user.id).await?;
    tracing::info!("🔐 User {} logged in", user.username);
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/token/refresh/",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessToken),
        (status = 400, description = "Missing refresh token"),
        (status = 401, description = "Token is invalid, expired or revoked")
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let mut errors = FieldErrors::new();
    require_text(&mut errors, WriteMode::Create, "refresh", &payload.refresh);
    errors.into_result()?;

    let refresh = given_str(&payload.refresh).unwrap_or_default();
    let access = TokenService::refresh_access(&state.db, &state.config, refresh).await?;
    Ok(Json(AccessToken { access }))
}

/// Revokes the given refresh token. Any problem with the body or the token is
/// answered with a bare 400.
#[utoipa::path(
    post,
    path = "/logout/",
    request_body = RefreshRequest,
    responses(
        (status = 205, description = "Refresh token revoked"),
        (status = 400, description = "Token missing, malformed or already revoked"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<StatusCode, AppError> {
    let refresh = body
        .as_ref()
        .and_then(|Json(value)| value.get("refresh"))
        .and_then(Value::as_str)
        .ok_or(AppError::RejectedToken)?;

    TokenService::blacklist(&state.db, &state.config, refresh).await?;
    Ok(StatusCode::RESET_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str, password2: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some(Some(username.to_string())),
            email: Some(Some(email.to_string())),
            password: Some(Some(password.to_string())),
            password2: Some(Some(password2.to_string())),
        }
    }

    fn errors_of(result: Result<(), AppError>) -> FieldErrors {
        match result {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_registration_passes() {
        let payload = request("cinephile", "c@example.com", "Kur0sawa-Ran", "Kur0sawa-Ran");
        assert!(check_registration(&payload, 8).is_ok());
    }

    #[test]
    fn test_password_mismatch_reported_on_password() {
        let payload = request("cinephile", "c@example.com", "Kur0sawa-Ran", "Kur0sawa-Ran!");
        let errors = errors_of(check_registration(&payload, 8));
        assert_eq!(errors.get("password"), Some(&["Passwords didn't match.".to_string()][..]));
    }

    #[test]
    fn test_missing_fields_and_bad_email() {
        let payload = RegisterRequest {
            username: None,
            email: Some(Some("not-an-email".to_string())),
            password: Some(Some("Kur0sawa-Ran".to_string())),
            password2: Some(None),
        };
        let errors = errors_of(check_registration(&payload, 8));
        assert!(errors.get("username").is_some());
        assert_eq!(
            errors.get("password2"),
            Some(&["This field may not be null.".to_string()][..])
        );
        assert_eq!(
            errors.get("email"),
            Some(&["Enter a valid email address.".to_string()][..])
        );
    }

    #[test]
    fn test_weak_password_rejected_before_mismatch() {
        let payload = request("cinephile", "c@example.com", "12345678", "other");
        let errors = errors_of(check_registration(&payload, 8));
        let messages = errors.get("password").unwrap_or_default();
        assert!(messages.contains(&"This password is entirely numeric.".to_string()));
        assert!(!messages.contains(&"Passwords didn't match.".to_string()));
    }

    #[test]
    fn test_overlong_password_skips_policy_checks() {
        let long = "Kur0sawa-".repeat(50_000);
        let payload = request("cinephile", &long, &long, &long);
        let errors = errors_of(check_registration(&payload, 8));
        assert_eq!(
            errors.get("password"),
            Some(&["Ensure this field has no more than 128 characters.".to_string()][..])
        );
        assert!(errors.get("email").is_some());
    }

    #[test]
    fn test_credentials_required() {
        let payload = LoginRequest {
            username: Some(Some("someone".to_string())),
            password: None,
        };
        let err = credentials(&payload).unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.get("password").is_some()));
    }
}
