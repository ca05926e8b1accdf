use crate::entities::users::Role;
use crate::services::account_service::{AccountService, NewUser};
use sea_orm::DatabaseConnection;
use std::env;
use tracing::{info, warn};

/// Creates an admin account from `ADMIN_USERNAME`, `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD` when all three are set and the username is free.
pub async fn bootstrap_admin(db: &DatabaseConnection) -> anyhow::Result<()> {
    let (Ok(username), Ok(email), Ok(password)) = (
        env::var("ADMIN_USERNAME"),
        env::var("ADMIN_EMAIL"),
        env::var("ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };

    if AccountService::find_by_username(db, &username).await?.is_some() {
        info!("🌱 Admin account {} already present", username);
        return Ok(());
    }

    if password.len() < 8 {
        warn!("⚠️ ADMIN_PASSWORD is shorter than 8 characters");
    }

    AccountService::create_user(
        db,
        NewUser {
            username: &username,
            email: &email,
            password: &password,
            role: Role::Admin,
        },
    )
    .await?;

    info!("🌱 Bootstrapped admin account {}", username);
    Ok(())
}
