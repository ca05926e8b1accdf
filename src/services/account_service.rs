use crate::api::error::{AppError, FieldErrors};
use crate::entities::{
    prelude::*,
    users::{self, Role},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

pub const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

pub struct AccountService;

impl AccountService {
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub async fn find_by_username<C: ConnectionTrait>(
        db: &C,
        username: &str,
    ) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?)
    }

    /// Inserts a user after checking the username is free. The password is
    /// hashed here; policy checks are the caller's concern.
    pub async fn create_user<C: ConnectionTrait>(
        db: &C,
        new_user: NewUser<'_>,
    ) -> Result<users::Model, AppError> {
        if Self::find_by_username(db, new_user.username).await?.is_some() {
            return Err(AppError::Validation(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }

        let user = users::ActiveModel {
            username: Set(new_user.username.to_string()),
            email: Set(new_user.email.to_string()),
            password_hash: Set(Self::hash_password(new_user.password)?),
            role: Set(new_user.role),
            avatar: Set(None),
            bio: Set(String::new()),
            social: Set(String::new()),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        tracing::info!("👤 Created user {} with role {}", user.username, user.role);
        Ok(user)
    }

    /// Credentials check shared by the login endpoints. Unknown users, wrong
    /// passwords and inactive accounts all produce the same 401.
    pub async fn authenticate<C: ConnectionTrait>(
        db: &C,
        username: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let user = Self::find_by_username(db, username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !user.is_active || !Self::verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    pub async fn set_role<C: ConnectionTrait>(
        db: &C,
        user: users::Model,
        role: Role,
    ) -> Result<users::Model, AppError> {
        let previous = user.role;
        let mut active: users::ActiveModel = user.into();
        active.role = Set(role);
        let updated = active.update(db).await?;

        tracing::info!(
            "🔑 Role of {} changed from {} to {}",
            updated.username,
            previous,
            updated.role
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies() {
        let hash = AccountService::hash_password("Sup3r-secret").unwrap();
        assert_ne!(hash, "Sup3r-secret");
        assert!(AccountService::verify_password("Sup3r-secret", &hash).unwrap());
        assert!(!AccountService::verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(AccountService::verify_password("x", "not-a-phc-string").is_err());
    }
}
