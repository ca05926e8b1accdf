//! Issuing, refreshing and revoking JWT pairs.
//!
//! Every refresh token is recorded in `outstanding_tokens` when issued. Logout
//! moves its `jti` to `blacklisted_tokens`, after which refresh and a second
//! logout both reject it. Rows of both tables are pruned once expired.

use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{blacklisted_tokens, outstanding_tokens, prelude::*};
use crate::utils::auth::{Claims, TokenType, create_jwt, validate_jwt};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

pub struct TokenService;

impl TokenService {
    pub async fn issue_pair<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        user_id: i32,
    ) -> Result<TokenPair, AppError> {
        let (refresh, claims) = create_jwt(
            user_id,
            TokenType::Refresh,
            config.refresh_token_lifetime(),
            &config.jwt_secret,
        )?;

        outstanding_tokens::ActiveModel {
            user_id: Set(user_id),
            jti: Set(claims.jti.clone()),
            created_at: Set(Utc::now()),
            expires_at: Set(claims.expires_at()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        let access = Self::issue_access(config, user_id)?;
        Ok(TokenPair { refresh, access })
    }

    fn issue_access(config: &AppConfig, user_id: i32) -> Result<String, AppError> {
        let (access, _) = create_jwt(
            user_id,
            TokenType::Access,
            config.access_token_lifetime(),
            &config.jwt_secret,
        )?;
        Ok(access)
    }

    async fn is_blacklisted<C: ConnectionTrait>(db: &C, jti: &str) -> Result<bool, AppError> {
        let hits = BlacklistedTokens::find()
            .filter(blacklisted_tokens::Column::Jti.eq(jti))
            .count(db)
            .await?;
        Ok(hits > 0)
    }

    /// Valid, unexpired, refresh-typed and not revoked.
    async fn usable_refresh<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        token: &str,
    ) -> Option<Result<Claims, AppError>> {
        let claims = validate_jwt(token, &config.jwt_secret, TokenType::Refresh).ok()?;
        match Self::is_blacklisted(db, &claims.jti).await {
            Ok(true) => None,
            Ok(false) => Some(Ok(claims)),
            Err(e) => Some(Err(e)),
        }
    }

    pub async fn refresh_access<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        refresh: &str,
    ) -> Result<String, AppError> {
        let claims = Self::usable_refresh(db, config, refresh)
            .await
            .ok_or_else(|| AppError::Unauthorized("Token is invalid or expired".to_string()))??;

        let active = Users::find_by_id(claims.user_id)
            .one(db)
            .await?
            .is_some_and(|u| u.is_active);
        if !active {
            return Err(AppError::Unauthorized(
                "No active account found for the given token.".to_string(),
            ));
        }

        Self::issue_access(config, claims.user_id)
    }

    /// Revokes a refresh token. Anything unusable, including a token that was
    /// already revoked, is reported as [`AppError::RejectedToken`].
    pub async fn blacklist<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        refresh: &str,
    ) -> Result<(), AppError> {
        let claims = Self::usable_refresh(db, config, refresh)
            .await
            .ok_or(AppError::RejectedToken)??;

        let inserted = BlacklistedTokens::insert(blacklisted_tokens::ActiveModel {
            jti: Set(claims.jti.clone()),
            user_id: Set(claims.user_id),
            blacklisted_at: Set(Utc::now()),
            expires_at: Set(claims.expires_at()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(blacklisted_tokens::Column::Jti)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

        // A concurrent logout won the race
        if inserted == 0 {
            return Err(AppError::RejectedToken);
        }

        tracing::info!("🚪 Refresh token {} revoked for user {}", claims.jti, claims.user_id);
        Ok(())
    }

    /// Deletes outstanding and blacklisted rows past their natural expiry.
    pub async fn prune_expired<C: ConnectionTrait>(db: &C) -> Result<u64, AppError> {
        let now = Utc::now();

        let outstanding = OutstandingTokens::delete_many()
            .filter(outstanding_tokens::Column::ExpiresAt.lt(now))
            .exec(db)
            .await?;
        let blacklisted = BlacklistedTokens::delete_many()
            .filter(blacklisted_tokens::Column::ExpiresAt.lt(now))
            .exec(db)
            .await?;

        Ok(outstanding.rows_affected + blacklisted.rows_affected)
    }
}
