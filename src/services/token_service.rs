use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use crate::models::errors::AppError;
use crate::utils::config::MAX_JWT_EXPIRY_MINUTES;

/// JWT claims carried by every access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: Duration::minutes(expiry_minutes.clamp(1, MAX_JWT_EXPIRY_MINUTES)),
        }
    }

    /// Signs a token for `user_id` that expires after the configured window
    pub fn generate_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.expiry)
                .ok_or_else(|| AppError::internal_error("Token expiry is out of range"))?
                .timestamp(),
        };

        self.sign(&claims)
    }

    /// Validates signature and expiry, returning the decoded claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::token_error(e.to_string()))
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal_error(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-signing-secret-0123456789";

    #[test]
    fn test_token_round_trip() {
        let service = TokenService::new(SECRET, 30);

        let token = service.generate_token("user-123").unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.user_id, "user-123");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_rejects_garbage_and_foreign_tokens() {
        let service = TokenService::new(SECRET, 30);
        assert!(service.verify_token("invalid").is_err());

        let other = TokenService::new("a-completely-different-secret-value", 30);
        let foreign = other.generate_token("user-123").unwrap();
        assert!(matches!(
            service.verify_token(&foreign),
            Err(AppError::TokenError { .. })
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = TokenService::new(SECRET, 30);
        let issued = Utc::now() - Duration::hours(2);
        let expired = service
            .sign(&Claims {
                user_id: "user-123".to_string(),
                iat: issued.timestamp(),
                exp: (issued + Duration::minutes(30)).timestamp(),
            })
            .unwrap();

        assert!(service.verify_token(&expired).is_err());
    }

    #[test]
    fn test_expiry_is_bounded() {
        let service = TokenService::new(SECRET, i64::MAX);
        let claims = service
            .verify_token(&service.generate_token("user-123").unwrap())
            .unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_JWT_EXPIRY_MINUTES * 60);

        let service = TokenService::new(SECRET, 0);
        assert_eq!(service.expiry(), Duration::minutes(1));
    }
}
