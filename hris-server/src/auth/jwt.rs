//! JWT token service
//!
//! Issues and validates HS256 access/refresh token pairs. Refresh tokens carry
//! a `jti` that is stored server-side so it can be rotated and revoked.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::UserRole;
use thiserror::Error;

const ISSUER: &str = "hris-server";

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (identity provider UID)
    pub sub: String,
    pub role: UserRole,
    pub token_type: TokenType,
    /// Token ID
    pub jti: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
    pub iss: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("wrong token type: expected {0:?}")]
    WrongTokenType(TokenType),

    #[error("token generation failed: {0}")]
    GenerationFailed(String),
}

impl From<JwtError> for AppError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::ExpiredToken => AppError::new(ErrorCode::TokenExpired),
            JwtError::GenerationFailed(msg) => {
                tracing::error!(error = %msg, "JWT creation failed");
                AppError::new(ErrorCode::InternalError)
            }
            other => AppError::invalid_token(other.to_string()),
        }
    }
}

/// A freshly issued access + refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// `jti` of the refresh token
    pub refresh_jti: String,
    /// Refresh token expiry (Unix milliseconds)
    pub refresh_expires_at: i64,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// JWT token service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn sign(
        &self,
        user_id: &str,
        role: UserRole,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<(String, Claims), JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))?;
        Ok((token, claims))
    }

    /// Issue a new access + refresh pair for a user
    pub fn issue_pair(&self, user_id: &str, role: UserRole) -> Result<TokenPair, JwtError> {
        let access_ttl = Duration::minutes(self.config.access_ttl_minutes);
        let (access_token, _) = self.sign(user_id, role, TokenType::Access, access_ttl)?;
        let (refresh_token, refresh) = self.sign(
            user_id,
            role,
            TokenType::Refresh,
            Duration::days(self.config.refresh_ttl_days),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_jti: refresh.jti,
            refresh_expires_at: refresh.exp * 1000,
            expires_in: access_ttl.num_seconds(),
        })
    }

    /// Validate signature, expiry and issuer
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }

    /// Validate and require `token_type`
    pub fn validate_as(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = self.validate(token)?;
        if claims.token_type != expected {
            return Err(JwtError::WrongTokenType(expected));
        }
        Ok(claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Authenticated user, inserted into request extensions by the auth middleware
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub role: UserRole,
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn ensure_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::AdminRequired))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-0123456789-0123456789".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        })
    }

    #[test]
    fn test_issue_and_validate_pair() {
        let jwt = service();
        let pair = jwt.issue_pair("uid-1", UserRole::Admin).unwrap();
        assert_eq!(pair.expires_in, 3600);

        let access = jwt.validate_as(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(access.sub, "uid-1");
        assert_eq!(access.role, UserRole::Admin);

        let refresh = jwt.validate_as(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert_eq!(refresh.jti, pair.refresh_jti);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let jwt = service();
        let pair = jwt.issue_pair("uid-1", UserRole::Employee).unwrap();
        let err = jwt.validate_as(&pair.access_token, TokenType::Refresh).unwrap_err();
        assert!(matches!(err, JwtError::WrongTokenType(TokenType::Refresh)));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let pair = service().issue_pair("uid-1", UserRole::Employee).unwrap();
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-0123456789-012345".to_string(),
            access_ttl_minutes: 60,
            refresh_ttl_days: 7,
        });
        assert!(matches!(
            other.validate(&pair.access_token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_maps_to_token_expired() {
        let jwt = service();
        let (token, _) = jwt
            .sign("uid-1", UserRole::Employee, TokenType::Access, Duration::minutes(-10))
            .unwrap();
        let err = jwt.validate(&token).unwrap_err();
        assert!(matches!(err, JwtError::ExpiredToken));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
        assert_eq!(JwtService::extract_from_header("Bearer "), None);
    }

    #[test]
    fn test_current_user_admin_guard() {
        let user = CurrentUser {
            id: "u".into(),
            role: UserRole::Employee,
        };
        assert_eq!(
            user.ensure_admin().unwrap_err().code,
            ErrorCode::AdminRequired
        );
    }
}
