pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::api::handlers::{auth, catalog, follows, health, users};
use crate::api::middleware::{
    auth::{auth_middleware, require_admin, require_admin_or_staff, require_user_directory},
    request_id::{REQUEST_ID, request_id_middleware},
    security::security_headers,
};
use crate::config::AppConfig;
use axum::{
    Router,
    http::{HeaderValue, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        catalog::genres::list_genres,
        catalog::genres::create_genre,
        catalog::genres::get_genre,
        catalog::genres::update_genre,
        catalog::genres::partial_update_genre,
        catalog::genres::delete_genre,
        catalog::themes::list_themes,
        catalog::themes::create_theme,
        catalog::themes::get_theme,
        catalog::themes::update_theme,
        catalog::themes::partial_update_theme,
        catalog::themes::delete_theme,
        catalog::countries::list_countries,
        catalog::countries::create_country,
        catalog::countries::get_country,
        catalog::countries::update_country,
        catalog::countries::partial_update_country,
        catalog::countries::delete_country,
        catalog::languages::list_languages,
        catalog::languages::create_language,
        catalog::languages::get_language,
        catalog::languages::update_language,
        catalog::languages::partial_update_language,
        catalog::languages::delete_language,
        catalog::studios::list_studios,
        catalog::studios::create_studio,
        catalog::studios::get_studio,
        catalog::studios::update_studio,
        catalog::studios::partial_update_studio,
        catalog::studios::delete_studio,
        catalog::films::list_films,
        catalog::films::create_film,
        catalog::films::get_film,
        catalog::films::update_film,
        catalog::films::partial_update_film,
        catalog::films::delete_film,
        auth::register,
        auth::login,
        auth::admin_login,
        auth::refresh_token,
        auth::logout,
        users::list_users,
        users::get_user,
        users::get_profile,
        users::edit_profile,
        users::set_role,
        users::list_private_users,
        users::get_private_user,
        follows::follow_user,
        follows::unfollow_user,
        follows::user_followers,
        follows::user_following,
        health::health_check,
    ),
    components(
        schemas(
            entities::genres::Model,
            entities::themes::Model,
            entities::countries::Model,
            entities::languages::Model,
            entities::users::Role,
            catalog::genres::GenrePayload,
            catalog::themes::ThemePayload,
            catalog::countries::CountryPayload,
            catalog::languages::LanguagePayload,
            catalog::studios::StudioPayload,
            catalog::studios::StudioResponse,
            catalog::films::FilmPayload,
            catalog::films::FilmListItem,
            catalog::films::FilmDetail,
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::AccessToken,
            services::token_service::TokenPair,
            users::UserPublic,
            users::UserPrivate,
            users::ProfileEditRequest,
            users::ProfileEditResponse,
            users::RoleRequest,
            users::RoleResponse,
            follows::FollowResponse,
            health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "genres", description = "Film genres"),
        (name = "themes", description = "Film themes"),
        (name = "countries", description = "Production countries"),
        (name = "languages", description = "Spoken languages"),
        (name = "studios", description = "Production studios"),
        (name = "films", description = "Films and their classifications"),
        (name = "auth", description = "Registration and JWT sessions"),
        (name = "users", description = "Profiles and roles"),
        (name = "follows", description = "Follow graph"),
        (name = "admin", description = "User directory for staff"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

fn cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let staff = || from_fn_with_state(state.clone(), require_admin_or_staff);
    let account = || from_fn_with_state(state.clone(), auth_middleware);
    let directory = || from_fn_with_state(state.clone(), require_user_directory);
    let admin = || from_fn_with_state(state.clone(), require_admin);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        // Catalog: public reads, staff writes
        .route(
            "/genres/",
            get(catalog::genres::list_genres)
                .merge(post(catalog::genres::create_genre).layer(staff())),
        )
        .route(
            "/genres/:id/",
            get(catalog::genres::get_genre).merge(
                put(catalog::genres::update_genre)
                    .patch(catalog::genres::partial_update_genre)
                    .delete(catalog::genres::delete_genre)
                    .layer(staff()),
            ),
        )
        .route(
            "/themes/",
            get(catalog::themes::list_themes)
                .merge(post(catalog::themes::create_theme).layer(staff())),
        )
        .route(
            "/themes/:id/",
            get(catalog::themes::get_theme).merge(
                put(catalog::themes::update_theme)
                    .patch(catalog::themes::partial_update_theme)
                    .delete(catalog::themes::delete_theme)
                    .layer(staff()),
            ),
        )
        .route(
            "/countries/",
            get(catalog::countries::list_countries)
                .merge(post(catalog::countries::create_country).layer(staff())),
        )
        .route(
            "/countries/:id/",
            get(catalog::countries::get_country).merge(
                put(catalog::countries::update_country)
                    .patch(catalog::countries::partial_update_country)
                    .delete(catalog::countries::delete_country)
                    .layer(staff()),
            ),
        )
        .route(
            "/languages/",
            get(catalog::languages::list_languages)
                .merge(post(catalog::languages::create_language).layer(staff())),
        )
        .route(
            "/languages/:id/",
            get(catalog::languages::get_language).merge(
                put(catalog::languages::update_language)
                    .patch(catalog::languages::partial_update_language)
                    .delete(catalog::languages::delete_language)
                    .layer(staff()),
            ),
        )
        .route(
            "/studios/",
            get(catalog::studios::list_studios)
                .merge(post(catalog::studios::create_studio).layer(staff())),
        )
        .route(
            "/studios/:id/",
            get(catalog::studios::get_studio).merge(
                put(catalog::studios::update_studio)
                    .patch(catalog::studios::partial_update_studio)
                    .delete(catalog::studios::delete_studio)
                    .layer(staff()),
            ),
        )
        .route(
            "/films/",
            get(catalog::films::list_films)
                .merge(post(catalog::films::create_film).layer(staff())),
        )
        .route(
            "/films/:id/",
            get(catalog::films::get_film).merge(
                put(catalog::films::update_film)
                    .patch(catalog::films::partial_update_film)
                    .delete(catalog::films::delete_film)
                    .layer(staff()),
            ),
        )
        // Sessions
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/admin-login/", post(auth::admin_login))
        .route("/token/refresh/", post(auth::refresh_token))
        .route("/logout/", post(auth::logout).layer(account()))
        // Profiles and follows
        .route("/users/", get(users::list_users))
        .route("/users/:id/", get(users::get_user))
        .route(
            "/users/:id/set-role/",
            patch(users::set_role).put(users::set_role).layer(admin()),
        )
        .route(
            "/users/:id/follow/",
            post(follows::follow_user).layer(account()),
        )
        .route(
            "/users/:id/unfollow/",
            post(follows::unfollow_user).layer(account()),
        )
        .route("/users/:id/followers/", get(follows::user_followers))
        .route("/users/:id/following/", get(follows::user_following))
        .route("/profile/", get(users::get_profile).layer(account()))
        .route(
            "/profile/edit/",
            patch(users::edit_profile)
                .put(users::edit_profile)
                .layer(account()),
        )
        .route(
            "/admin/users/",
            get(users::list_private_users).layer(directory()),
        )
        .route(
            "/admin/users/:id/",
            get(users::get_private_user).layer(directory()),
        )
        .layer(cors(&state.config))
        .layer(from_fn(security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &Request<_>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
