use std::env;

/// Runtime configuration for the catalog API
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// JWT signing secret (required in production)
    pub jwt_secret: String,

    /// Lifetime of access tokens in minutes (default: 5)
    pub access_token_lifetime_minutes: i64,

    /// Lifetime of refresh tokens in days (default: 1)
    pub refresh_token_lifetime_days: i64,

    /// Minimum accepted password length at registration (default: 8)
    pub min_password_length: usize,

    /// How often the background worker prunes expired tokens, in seconds (default: 3600)
    pub token_prune_interval_secs: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            access_token_lifetime_minutes: 5,
            refresh_token_lifetime_days: 1,
            min_password_length: 8,
            token_prune_interval_secs: 3600,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            access_token_lifetime_minutes: env::var("ACCESS_TOKEN_LIFETIME_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.access_token_lifetime_minutes),

            refresh_token_lifetime_days: env::var("REFRESH_TOKEN_LIFETIME_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.refresh_token_lifetime_days),

            min_password_length: env::var("MIN_PASSWORD_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.min_password_length),

            token_prune_interval_secs: env::var("TOKEN_PRUNE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_prune_interval_secs),

            allowed_origins: parse_origins(env::var("ALLOWED_ORIGINS").ok())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Picks the preset named by `APP_ENV`: `production`, `development`, or
    /// plain environment variables for anything else.
    pub fn for_environment(app_env: Option<&str>) -> anyhow::Result<Self> {
        match app_env {
            Some("production") => Self::production(),
            Some("development") => Ok(Self::development()),
            _ => Ok(Self::from_env()),
        }
    }

    /// Create config for development (long-lived tokens)
    pub fn development() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            access_token_lifetime_minutes: 60,
            refresh_token_lifetime_days: 7,
            min_password_length: 8,
            token_prune_interval_secs: 600,
            allowed_origins: Self::default().allowed_origins,
        }
    }

    /// Create config for production. Fails when `JWT_SECRET` is missing.
    pub fn production() -> anyhow::Result<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("CRITICAL: JWT_SECRET must be set"))?;
        let from_env = Self::from_env();

        Ok(Self {
            jwt_secret,
            allowed_origins: parse_origins(env::var("ALLOWED_ORIGINS").ok()).unwrap_or_default(),
            ..from_env
        })
    }

    pub fn access_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_lifetime_minutes)
    }

    pub fn refresh_token_lifetime(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_token_lifetime_days)
    }
}

fn parse_origins(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
