#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use film_catalog_backend::config::AppConfig;
use film_catalog_backend::entities::users::Role;
use film_catalog_backend::infrastructure::database;
use film_catalog_backend::services::account_service::AccountService;
use film_catalog_backend::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "Tarkovsky-1972";

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
}

pub async fn setup() -> TestApp {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    // One connection so every query sees the same in-memory database
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let config = AppConfig {
        jwt_secret: "test-secret".to_string(),
        ..AppConfig::default()
    };
    let app = create_app(AppState {
        db: db.clone(),
        config,
    });

    TestApp { app, db }
}

impl TestApp {
    /// Sends a request and returns the status with the body parsed as JSON
    /// (`Value::Null` when the body is empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn register(&self, username: &str) -> i32 {
        let (status, body) = self
            .post(
                "/register/",
                None,
                json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": PASSWORD,
                    "password2": PASSWORD,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["id"].as_i64().unwrap() as i32
    }

    /// Returns `(access, refresh)`.
    pub async fn login(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/login/",
                None,
                json!({"username": username, "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        (
            body["access"].as_str().unwrap().to_string(),
            body["refresh"].as_str().unwrap().to_string(),
        )
    }

    pub async fn set_role(&self, username: &str, role: Role) {
        let user = AccountService::find_by_username(&self.db, username)
            .await
            .unwrap()
            .unwrap();
        AccountService::set_role(&self.db, user, role).await.unwrap();
    }

    /// Registers `username`, assigns `role` and logs in. Returns `(id, access, refresh)`.
    pub async fn account(&self, username: &str, role: Role) -> (i32, String, String) {
        let id = self.register(username).await;
        if role != Role::User {
            self.set_role(username, role).await;
        }
        let (access, refresh) = self.login(username).await;
        (id, access, refresh)
    }
}
