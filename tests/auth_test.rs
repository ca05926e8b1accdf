mod common;

use axum::http::StatusCode;
use common::{PASSWORD, setup};
use film_catalog_backend::entities::users::Role;
use serde_json::{Value, json};

#[tokio::test]
async fn test_register_returns_public_fields() {
    let t = setup().await;

    let (status, body) = t
        .post(
            "/register/",
            None,
            json!({
                "username": "agnes",
                "email": "agnes@example.com",
                "password": PASSWORD,
                "password2": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "agnes");
    assert_eq!(body["email"], "agnes@example.com");
    assert!(body["id"].is_number());
    assert!(body.get("password").is_none());

    let (status, body) = t
        .post(
            "/register/",
            None,
            json!({
                "username": "agnes",
                "email": "other@example.com",
                "password": PASSWORD,
                "password2": PASSWORD,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"], json!(["A user with that username already exists."]));
}

#[tokio::test]
async fn test_password_mismatch_creates_no_user() {
    let t = setup().await;

    let (status, body) = t
        .post(
            "/register/",
            None,
            json!({
                "username": "chantal",
                "email": "chantal@example.com",
                "password": PASSWORD,
                "password2": "Something-else-99",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["password"], json!(["Passwords didn't match."]));

    let (_, users) = t.get("/users/", None).await;
    assert_eq!(users, json!([]));

    let (status, _) = t
        .post(
            "/login/",
            None,
            json!({"username": "chantal", "password": PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_weak_password_rejected() {
    let t = setup().await;

    let (status, body) = t
        .post(
            "/register/",
            None,
            json!({
                "username": "claire",
                "email": "claire@example.com",
                "password": "1234",
                "password2": "1234",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages = body["password"].as_array().cloned().unwrap_or_default();
    assert!(messages.contains(&json!(
        "This password is too short. It must contain at least 8 characters."
    )));
    assert!(messages.contains(&json!("This password is entirely numeric.")));
}

#[tokio::test]
async fn test_overlong_password_rejected() {
    let t = setup().await;
    let password = "Kinugasa-".repeat(20_000);

    let (status, body) = t
        .post(
            "/register/",
            None,
            json!({
                "username": "teinosuke",
                "email": "teinosuke@example.com",
                "password": password,
                "password2": password,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["password"],
        json!(["Ensure this field has no more than 128 characters."])
    );

    let (_, users) = t.get("/users/", None).await;
    assert_eq!(users, json!([]));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let t = setup().await;
    t.register("jacques").await;

    let (status, body) = t
        .post(
            "/login/",
            None,
            json!({"username": "jacques", "password": "not-the-password"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "No active account found with the given credentials");
}

#[tokio::test]
async fn test_admin_login_requires_admin_or_staff() {
    let t = setup().await;
    t.register("eric").await;
    t.register("maurice").await;
    t.set_role("maurice", Role::Staff).await;

    let credentials = |username: &str| json!({"username": username, "password": PASSWORD});

    let (status, body) = t.post("/admin-login/", None, credentials("eric")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["non_field_errors"],
        json!(["You are not authorized to access the admin panel."])
    );

    let (status, body) = t.post("/login/", None, credentials("eric")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    let (status, body) = t.post("/admin-login/", None, credentials("maurice")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["refresh"].is_string());
}

#[tokio::test]
async fn test_refresh_and_logout_lifecycle() {
    let t = setup().await;
    let (_, access, refresh) = t.account("alain", Role::User).await;

    let (status, body) = t
        .post("/token/refresh/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    // An access token is not a refresh token
    let (status, _) = t
        .post("/token/refresh/", None, json!({"refresh": access}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .post("/logout/", Some(access.as_str()), json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::RESET_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = t
        .post("/token/refresh/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .post("/logout/", Some(access.as_str()), json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_logout_rejects_missing_or_garbage_tokens() {
    let t = setup().await;
    let (_, access, refresh) = t.account("louis", Role::User).await;

    let (status, _) = t.post("/logout/", None, json!({"refresh": refresh})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t.post("/logout/", Some(access.as_str()), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);

    let (status, body) = t
        .post("/logout/", Some(access.as_str()), json!({"refresh": "garbage"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_invalid_bearer_token_is_unauthorized() {
    let t = setup().await;

    let (status, body) = t.get("/profile/", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Given token not valid for any token type");
}

#[tokio::test]
async fn test_profile_view_and_edit() {
    let t = setup().await;
    let (id, access, _) = t.account("jean", Role::User).await;

    let (status, body) = t.get("/profile/", Some(access.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "jean@example.com");
    assert_eq!(body["role"], "user");
    assert_eq!(body["followers_count"], 0);

    let (status, body) = t
        .send(
            "PATCH",
            "/profile/edit/",
            Some(access.as_str()),
            Some(json!({"social": "not a url"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["social"], json!(["Enter a valid URL."]));

    let (status, body) = t
        .send(
            "PATCH",
            "/profile/edit/",
            Some(access.as_str()),
            Some(json!({"bio": "Breathless", "social": "https://example.com/jean", "role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"avatar": null, "bio": "Breathless", "social": "https://example.com/jean"})
    );

    let (_, profile) = t.get("/profile/", Some(access.as_str())).await;
    assert_eq!(profile["role"], "user");
    assert_eq!(profile["bio"], "Breathless");
}

#[tokio::test]
async fn test_set_role_is_admin_only() {
    let t = setup().await;
    let (target, target_access, _) = t.account("francois", Role::User).await;
    let (_, staff, _) = t.account("claude", Role::Staff).await;
    let (_, admin, _) = t.account("henri", Role::Admin).await;
    let uri = format!("/users/{}/set-role/", target);

    let (status, _) = t
        .send("PATCH", &uri, Some(staff.as_str()), Some(json!({"role": "staff"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = t
        .send("PATCH", &uri, Some(admin.as_str()), Some(json!({"role": "superuser"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["role"], json!(["\"superuser\" is not a valid choice."]));

    let (status, _) = t
        .send(
            "PATCH",
            "/users/9999/set-role/",
            Some(admin.as_str()),
            Some(json!({"role": "staff"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t
        .send("PATCH", &uri, Some(admin.as_str()), Some(json!({"role": "staff"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"role": "staff"}));

    // The new role applies to tokens issued before the change
    let (status, _) = t
        .post("/genres/", Some(target_access.as_str()), json!({"name": "Nouvelle Vague"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_private_user_directory() {
    let t = setup().await;
    let (_, user, _) = t.account("agnes", Role::User).await;
    let (_, staff, _) = t.account("jacques", Role::Staff).await;

    let (status, _) = t.get("/admin/users/", Some(user.as_str())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t.get("/admin/users/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t.get("/admin/users/?role=staff", Some(staff.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["username"], "jacques");
    assert_eq!(body[0]["email"], "jacques@example.com");

    let (status, body) = t.get("/admin/users/?search=AGN", Some(staff.as_str())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["username"], "agnes");

    let (status, body) = t.get("/admin/users/?role=director", Some(staff.as_str())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["role"].is_array());

    let (_, public) = t.get("/users/", None).await;
    assert!(public[0].get("email").is_none());
    assert!(public[0].get("role").is_none());
}
