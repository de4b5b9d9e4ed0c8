//! JWT Authentication
//!
//! HS256 bearer tokens issued by `POST /api/v1/auth/login`.
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! [`require_auth`] validates the token and stores the [`AuthClaims`] in the
//! request extensions, where handlers pick them up with the `AuthClaims`
//! extractor. [`require_admin`] is layered inside it on the admin routes.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub const ROLE_PLAYER: &str = "player";
pub const ROLE_ADMIN: &str = "admin";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    /// Token lifetime
    pub ttl: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtConfig {
    /// Minimum secret length
    pub const MIN_SECRET_LENGTH: usize = 32;

    pub fn try_new(secret: impl Into<String>, ttl_secs: i64) -> ApiResult<Self> {
        let secret = secret.into();
        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(ApiError::validation(format!(
                "JWT secret must be at least {} bytes, got {}",
                Self::MIN_SECRET_LENGTH,
                secret.len()
            )));
        }
        if ttl_secs <= 0 {
            return Err(ApiError::validation("JWT lifetime must be positive"));
        }
        Ok(Self {
            secret,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Sign a token for a player
    pub fn issue(&self, player_id: Uuid, telegram_id: i64, roles: Vec<String>) -> ApiResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = AuthClaims {
            sub: player_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            roles,
            telegram_id,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry
    pub fn validate(&self, token: &str) -> ApiResult<AuthClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::unauthorized("token has expired"),
            _ => ApiError::unauthorized(format!("invalid token: {}", e)),
        })?;
        Ok(data.claims)
    }
}

/// Signed token and its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Roles granted to a player
pub fn roles_for(is_admin: bool) -> Vec<String> {
    let mut roles = vec![ROLE_PLAYER.to_string()];
    if is_admin {
        roles.push(ROLE_ADMIN.to_string());
    }
    roles
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Player id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    pub telegram_id: i64,
}

impl AuthClaims {
    pub fn player_id(&self) -> ApiResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| ApiError::unauthorized("token subject is not a player id"))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthClaims>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_token(header: &str) -> ApiResult<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("expected: Authorization: Bearer <token>"))
}

/// Validate the bearer token and store its claims on the request
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Authorization header is required"))?;

    let claims = state.jwt.validate(extract_token(header)?)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Reject callers without the admin role; runs after [`require_auth`]
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthClaims>() {
        Some(claims) if claims.is_admin() => Ok(next.run(request).await),
        Some(_) => Err(ApiError::forbidden("admin role required")),
        None => Err(ApiError::unauthorized("authentication required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret-that-is-long-enough";

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtConfig::try_new("short", 60).is_err());
        assert!(JwtConfig::try_new(SECRET, 0).is_err());
    }

    #[test]
    fn test_issue_and_validate() {
        let config = JwtConfig::try_new(SECRET, 3600).unwrap();
        let player_id = Uuid::new_v4();
        let issued = config.issue(player_id, 42, roles_for(false)).unwrap();

        let claims = config.validate(&issued.token).unwrap();
        assert_eq!(claims.player_id().unwrap(), player_id);
        assert_eq!(claims.telegram_id, 42);
        assert!(claims.has_role(ROLE_PLAYER));
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtConfig::try_new(SECRET, 3600).unwrap();
        let other = JwtConfig::try_new("another-secret-of-sufficient-length!!", 3600).unwrap();
        let issued = issuer.issue(Uuid::new_v4(), 1, roles_for(true)).unwrap();
        assert!(other.validate(&issued.token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = JwtConfig::try_new(SECRET, 3600).unwrap();
        let claims = AuthClaims {
            sub: Uuid::new_v4().to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
            roles: roles_for(false),
            telegram_id: 1,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = config.validate(&token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: token has expired");
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token("Bearer abc123").unwrap(), "abc123");
        assert!(extract_token("Basic abc123").is_err());
        assert!(extract_token("Bearer ").is_err());
    }

    #[test]
    fn test_admin_roles() {
        assert_eq!(roles_for(true), vec!["player", "admin"]);
    }
}
