//! Bearer token issuance and validation (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::errors::{AppError, AppResult};

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id the token was issued to.
    pub sub: String,
    /// User email at issuance time.
    pub email: String,
    /// Audience.
    pub aud: String,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Builds claims for a user valid for `ttl_secs` from now.
    pub fn new(user_id: i64, email: &str, audience: &str, ttl_secs: u64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Parses the subject back into a user id.
    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("invalid payload: subject is not a user id".into()))
    }
}

/// Signs claims into a compact JWT.
pub fn issue_token(claims: &Claims, config: &JwtConfig) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
}

/// Verifies signature, expiry and audience of a token.
pub fn validate_token(token: &str, config: &JwtConfig) -> AppResult<Claims> {
    let mut validation = Validation::default();
    validation.leeway = 5;
    validation.set_audience(&[config.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "aud", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("error occurred validating token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            ttl_secs: 60,
            audience: "db-dashboards".to_string(),
        }
    }

    #[test]
    fn test_issue_then_validate() {
        let cfg = config("secret");
        let claims = Claims::new(42, "a@example.com", &cfg.audience, cfg.ttl_secs);
        let token = issue_token(&claims, &cfg).unwrap();

        let decoded = validate_token(&token, &cfg).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.user_id().unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::new(1, "a@example.com", "db-dashboards", 60);
        let token = issue_token(&claims, &config("one")).unwrap();
        assert!(matches!(
            validate_token(&token, &config("two")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let cfg = config("secret");
        let mut claims = Claims::new(1, "a@example.com", &cfg.audience, 60);
        claims.iat -= 3600;
        claims.exp = claims.iat + 10;
        let token = issue_token(&claims, &cfg).unwrap();
        assert!(validate_token(&token, &cfg).is_err());
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let cfg = config("secret");
        let claims = Claims::new(1, "a@example.com", "someone-else", 60);
        let token = issue_token(&claims, &cfg).unwrap();
        assert!(validate_token(&token, &cfg).is_err());
    }
}
