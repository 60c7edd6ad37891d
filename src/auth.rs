//! Identity collaborator: verified `(identity, role)` for every request.
//!
//! The core never checks credentials. An [`IdentityVerifier`] turns an
//! opaque bearer token into a [`Caller`]; handlers receive the caller via
//! the axum extractor implemented below.
//!
//! ```text
//! Authorization: Bearer <token> → IdentityVerifier → Caller → services
//! ```

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::{Role, Scope, UserId};
use crate::error::ServiceError;

/// A verified identity and its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Caller {
    /// Verified user identity.
    pub user_id: UserId,
    /// Role granted to the identity.
    pub role: Role,
    /// Login name, when the token carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Caller {
    /// Creates a caller without a username.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            username: None,
        }
    }

    /// Returns `true` for operators.
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.role == Role::Operator
    }

    /// Fails unless the caller is an operator.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] for any other role.
    pub fn require_operator(&self, action: &str) -> Result<(), ServiceError> {
        self.require_role(Role::Operator, action)
    }

    /// Fails unless the caller holds `role`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::PermissionDenied`] on a role mismatch.
    pub fn require_role(&self, role: Role, action: &str) -> Result<(), ServiceError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "{action} requires role {role}"
            )))
        }
    }

    /// Row-level scope for read paths.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        Scope::for_identity(self.role, self.user_id)
    }
}

/// Turns an opaque bearer token into a verified [`Caller`].
pub trait IdentityVerifier: fmt::Debug + Send + Sync {
    /// Verifies `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] if the token is invalid,
    /// expired, or names an unknown role.
    fn verify(&self, token: &str) -> Result<Caller, ServiceError>;
}

/// JWT claims accepted by [`JwtVerifier`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity.
    pub user_id: String,
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Granted role.
    pub role: Role,
    /// Expiry (seconds since the epoch).
    pub exp: i64,
    /// Issued-at (seconds since the epoch).
    #[serde(default)]
    pub iat: i64,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 bearer-token verifier.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &Algorithm::HS256)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl JwtVerifier {
    /// Creates a verifier for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &[u8], issuer: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss.as_str()]);
        }
        Self {
            decoding: DecodingKey::from_secret(secret),
            encoding: EncodingKey::from_secret(secret),
            validation,
            issuer,
        }
    }

    /// Signs a token for `user_id`. Intended for tooling and tests; the
    /// service itself never issues tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if signing fails.
    pub fn issue(
        &self,
        user_id: UserId,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token signing failed: {e}")))
    }
}

impl IdentityVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Caller, ServiceError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "bearer token rejected");
                ServiceError::Unauthorized("invalid token".to_string())
            })?;
        let claims = data.claims;
        let user_id = claims
            .user_id
            .parse::<UserId>()
            .map_err(|_| ServiceError::Unauthorized("invalid token subject".to_string()))?;
        Ok(Caller {
            user_id,
            role: claims.role,
            username: Some(claims.username).filter(|u| !u.is_empty()),
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ServiceError::Unauthorized("bearer token required".to_string()))?;
        state.verifier.verify(token)
    }
}
