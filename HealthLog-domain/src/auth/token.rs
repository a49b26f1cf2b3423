use std::env;
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::token_blacklist;
use crate::auth::Claims;

const DEFAULT_ISSUER: &str = "health-log-api";
const DEFAULT_ACCESS_MINUTES: i64 = 60;
const DEFAULT_REFRESH_DAYS: i64 = 7;

/// Failures while issuing or checking credentials
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidToken,

    /// A refresh token was presented where an access token is required, or the reverse
    #[error("Expected a {expected:?} token")]
    WrongTokenType { expected: TokenType },

    #[error("Security configuration error: {0}")]
    ConfigError(String),

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<JwtError> for SecurityError {
    fn from(err: JwtError) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                SecurityError::InvalidToken
            }
            _ => SecurityError::TokenValidation(err.to_string()),
        }
    }
}

/// Which half of a token pair a JWT is
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// Lifetime of a freshly issued token, overridable through
    /// `ACCESS_TOKEN_EXPIRATION_MINUTES` and `REFRESH_TOKEN_EXPIRATION_DAYS`
    pub fn expiration(&self) -> Duration {
        let parse = |key: &str| env::var(key).ok().and_then(|v| v.parse::<i64>().ok());

        match self {
            TokenType::Access => {
                Duration::minutes(parse("ACCESS_TOKEN_EXPIRATION_MINUTES").unwrap_or(DEFAULT_ACCESS_MINUTES))
            }
            TokenType::Refresh => {
                Duration::days(parse("REFRESH_TOKEN_EXPIRATION_DAYS").unwrap_or(DEFAULT_REFRESH_DAYS))
            }
        }
    }
}

/// Signing material read from the environment on every call, so tests and
/// operators can rotate `JWT_SECRET` without a restart
struct SigningConfig {
    secret: String,
    issuer: String,
}

impl SigningConfig {
    fn load() -> Result<Self, SecurityError> {
        let secret = env::var("JWT_SECRET").map_err(|e| {
            error!("JWT_SECRET is not set: {}", e);
            SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
        })?;
        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        Ok(Self { secret, issuer })
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }
}

/// Sign a new token for `user_id`. Every token gets its own `jti` so it can
/// be revoked on its own.
pub fn generate_token(user_id: &str, email: &str, token_type: TokenType) -> Result<String, SecurityError> {
    let config = SigningConfig::load()?;

    let issued_at = Utc::now();
    let expires_at = issued_at + token_type.expiration();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iss: config.issuer.clone(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
        typ: token_type,
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &config.encoding_key()).map_err(|e| {
        error!("Failed to sign {:?} token: {}", token_type, e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    info!("Issued {:?} token for user {}", token_type, user_id);
    debug!("Token {} expires at {}", claims.jti, expires_at);

    Ok(token)
}

/// Decode `token`, then reject it if it is the wrong kind or was revoked
pub fn validate_token(token: &str, expected: TokenType) -> Result<Claims, SecurityError> {
    let config = SigningConfig::load()?;
    let claims = decode::<Claims>(token, &config.decoding_key(), &config.validation())?.claims;

    if claims.typ != expected {
        return Err(SecurityError::WrongTokenType { expected });
    }

    if token_blacklist::blacklist().is_revoked(&claims.jti) {
        debug!("Rejected revoked token {} for user {}", claims.jti, claims.sub);
        return Err(SecurityError::TokenRevoked);
    }

    Ok(claims)
}

/// Revoke one token until its own expiry
pub fn revoke_token(claims: &Claims) {
    let expires_at = u64::try_from(claims.exp)
        .map(|secs| UNIX_EPOCH + StdDuration::from_secs(secs))
        .unwrap_or_else(|_| SystemTime::now());

    token_blacklist::blacklist().revoke_token(&claims.jti, expires_at);
    info!("Revoked {:?} token {} for user {}", claims.typ, claims.jti, claims.sub);
}
