use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: i32,
    pub token_type: TokenType,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

impl Claims {
    /// Expiry as a UTC timestamp, for persisting alongside the token id.
    pub fn expires_at(&self) -> chrono::DateTime<Utc> {
        chrono::DateTime::from_timestamp(self.exp as i64, 0).unwrap_or_else(Utc::now)
    }
}

pub fn create_jwt(
    user_id: i32,
    token_type: TokenType,
    lifetime: Duration,
    secret: &str,
) -> Result<(String, Claims)> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(lifetime)
        .ok_or_else(|| anyhow!("token lifetime overflows the clock"))?
        .timestamp();

    let claims = Claims {
        user_id,
        token_type,
        exp: expiration as usize,
        iat: now.timestamp() as usize,
        jti: uuid::Uuid::new_v4().simple().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok((token, claims))
}

/// Decodes and verifies signature and expiry, then checks the token type.
pub fn validate_jwt(token: &str, secret: &str, expected: TokenType) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    if token_data.claims.token_type != expected {
        return Err(anyhow!("Token has wrong type"));
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_cycle() {
        let secret = "test_secret";
        let (token, issued) =
            create_jwt(42, TokenType::Access, Duration::minutes(5), secret).unwrap();
        let claims = validate_jwt(&token, secret, TokenType::Access).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn test_wrong_token_type_is_rejected() {
        let secret = "test_secret";
        let (token, _) = create_jwt(1, TokenType::Access, Duration::minutes(5), secret).unwrap();
        assert!(validate_jwt(&token, secret, TokenType::Refresh).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let (token, _) = create_jwt(1, TokenType::Refresh, Duration::days(1), "a").unwrap();
        assert!(validate_jwt(&token, "b", TokenType::Refresh).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Past the default 60s leeway
        let (token, _) =
            create_jwt(1, TokenType::Access, Duration::minutes(-5), "secret").unwrap();
        assert!(validate_jwt(&token, "secret", TokenType::Access).is_err());
    }

    #[test]
    fn test_jti_is_unique_per_token() {
        let (_, a) = create_jwt(1, TokenType::Refresh, Duration::days(1), "s").unwrap();
        let (_, b) = create_jwt(1, TokenType::Refresh, Duration::days(1), "s").unwrap();
        assert_ne!(a.jti, b.jti);
    }
}
