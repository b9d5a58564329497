// Authentication: JWT token handling and bcrypt-backed credentials

use crate::db::repositories::user::UserRepository;
use crate::errors::{AppError, AuthError};
use crate::models::{NewUser, User, UserClaims, UserUpdate};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// JWT token service for encoding and decoding tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    expiration_hours: i64,
}

impl JwtService {
    /// Create a new JWT service with the given secret and expiration
    #[instrument(skip(secret))]
    pub fn new(secret: &str, expiration_hours: u64) -> Self {
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            expiration_hours: expiration_hours as i64,
        }
    }

    /// Issue an HS256 token carrying the username and admin flag
    #[instrument(skip(self))]
    pub fn encode_token(&self, username: &str, is_admin: bool) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = UserClaims {
            username: username.to_string(),
            is_admin,
            exp: (now + Duration::hours(self.expiration_hours)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to encode JWT token");
            AuthError::InvalidToken(format!("Failed to encode token: {}", e))
        })
    }

    /// Decode a token, checking signature and expiry
    #[instrument(skip(self, token))]
    pub fn decode_token(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data =
            decode::<UserClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                warn!(error = %e, "Rejected JWT token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }
}

/// Credential checks and user writes that involve password hashing
#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    user_repository: Arc<UserRepository>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(jwt_service: JwtService, user_repository: UserRepository, bcrypt_cost: u32) -> Self {
        Self {
            jwt_service,
            user_repository: Arc::new(user_repository),
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(|e| {
            error!(error = %e, "Failed to hash password");
            AuthError::HashingFailed(e.to_string())
        })
    }

    /// Verify username and password
    ///
    /// Unknown user and wrong password fail identically.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let Some((user, password_hash)) = self.user_repository.find_with_password(username).await?
        else {
            warn!(username = %username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials.into());
        };

        let password_valid = bcrypt::verify(password, &password_hash).map_err(|e| {
            error!(error = %e, "Failed to verify password");
            AuthError::HashingFailed(e.to_string())
        })?;

        if !password_valid {
            warn!(username = %username, "Invalid password");
            return Err(AuthError::InvalidCredentials.into());
        }

        tracing::info!(username = %user.username, "User authenticated");
        Ok(user)
    }

    /// Create a user, hashing the password with the configured cost
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn register(&self, new_user: &NewUser) -> Result<User, AppError> {
        let password_hash = self.hash_password(&new_user.password)?;
        self.user_repository.create(new_user, &password_hash).await
    }

    /// Partially update a user, re-hashing the password when one is supplied
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, username: &str, patch: UserUpdate) -> Result<User, AppError> {
        let password_hash = match patch.password.as_deref() {
            Some(password) => Some(self.hash_password(password)?),
            None => None,
        };
        self.user_repository
            .update(username, patch, password_hash)
            .await
    }

    /// Issue a token for an authenticated user
    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        Ok(self.jwt_service.encode_token(&user.username, user.is_admin)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_service_encode_decode() {
        let service = JwtService::new("test-secret", 24);

        let token = service
            .encode_token("u1", true)
            .expect("Failed to encode token");

        let claims = service
            .decode_token(&token)
            .expect("Failed to decode token");

        assert_eq!(claims.username, "u1");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_claims_use_is_admin_key() {
        let service = JwtService::new("test-secret", 24);
        let token = service.encode_token("u1", false).unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"ignored"),
            &validation,
        )
        .unwrap();
        assert_eq!(raw.claims["isAdmin"], false);
        assert_eq!(raw.claims["username"], "u1");
    }

    #[test]
    fn test_jwt_service_expired_token() {
        let service = JwtService::new("test-secret", 1);

        let now = Utc::now();
        let claims = UserClaims {
            username: "u1".to_string(),
            is_admin: false,
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };

        let encoding_key = EncodingKey::from_secret("test-secret".as_bytes());
        let token = encode(&Header::default(), &claims, &encoding_key)
            .expect("Failed to encode token");

        let result = service.decode_token(&token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_jwt_service_wrong_secret() {
        let issuer = JwtService::new("one-secret", 24);
        let verifier = JwtService::new("another-secret", 24);
        let token = issuer.encode_token("u1", true).unwrap();
        assert!(matches!(
            verifier.decode_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_jwt_service_invalid_token() {
        let service = JwtService::new("test-secret", 24);
        let result = service.decode_token("invalid.token.here");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
