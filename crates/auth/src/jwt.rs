use crate::error::{AuthError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // User ID
    pub email: String,         // User email
    pub exp: i64,              // Expiration time
    pub iat: i64,              // Issued at
    pub jti: String,           // JWT ID (unique identifier)
    pub token_type: TokenType, // access or refresh
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::InvalidToken("Invalid subject".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_token_exp_hours: i64,
    refresh_token_exp_days: i64,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            access_token_exp_hours: 1,  // 1 hour default
            refresh_token_exp_days: 30, // 30 days default
        }
    }

    pub fn with_expiration(mut self, access_token_exp_hours: i64, refresh_token_exp_days: i64) -> Self {
        self.access_token_exp_hours = access_token_exp_hours;
        self.refresh_token_exp_days = refresh_token_exp_days;
        self
    }

    /// Access token lifetime in seconds
    pub fn access_token_ttl(&self) -> i64 {
        self.access_token_exp_hours * 3600
    }

    /// Generate an access token
    pub fn generate_access_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        self.generate(user_id, email, TokenType::Access, Duration::hours(self.access_token_exp_hours))
    }

    /// Generate a refresh token
    pub fn generate_refresh_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        self.generate(user_id, email, TokenType::Refresh, Duration::days(self.refresh_token_exp_days))
    }

    fn generate(
        &self,
        user_id: Uuid,
        email: &str,
        token_type: TokenType,
        lifetime: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + lifetime;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(self.algorithm);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }

    /// Validate access token specifically
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken(
                "Token is not an access token".to_string(),
            ));
        }

        Ok(claims)
    }

    /// Validate refresh token specifically
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidToken(
                "Token is not a refresh token".to_string(),
            ));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-min-32-characters-long";

    #[test]
    fn test_access_token_round_trip() {
        let jwt = JwtService::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = jwt
            .generate_access_token(user_id, "jane@example.com")
            .expect("Failed to generate token");

        let claims = jwt
            .validate_access_token(&token)
            .expect("Failed to validate token");

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let jwt = JwtService::new(SECRET);
        let user_id = Uuid::new_v4();

        let access = jwt.generate_access_token(user_id, "a@example.com").unwrap();
        let refresh = jwt.generate_refresh_token(user_id, "a@example.com").unwrap();

        assert!(matches!(
            jwt.validate_refresh_token(&access),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            jwt.validate_access_token(&refresh),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(jwt.validate_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::new(SECRET);
        let other = JwtService::new("another-secret-key-min-32-characters");

        let token = issuer.generate_access_token(Uuid::new_v4(), "a@example.com").unwrap();
        assert!(matches!(
            other.validate_access_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative lifetime puts exp well behind the default leeway
        let jwt = JwtService::new(SECRET).with_expiration(-2, 30);
        let token = jwt.generate_access_token(Uuid::new_v4(), "a@example.com").unwrap();

        assert!(matches!(
            jwt.validate_access_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = JwtService::new(SECRET);
        assert!(jwt.validate_token("not.a.jwt").is_err());
    }
}
