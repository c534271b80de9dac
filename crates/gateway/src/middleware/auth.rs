//! Authentication middleware.
//!
//! Tokens are issued by the identity provider; the gateway only verifies
//! them and turns the claims into an [`ActorContext`].

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{ActorContext, Role};

use crate::state::AppState;

const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// Identity provider claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Profile identifier
    pub sub: Uuid,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}

impl From<Claims> for ActorContext {
    fn from(claims: Claims) -> Self {
        let role = claims.role.as_deref().map(Role::from).unwrap_or(Role::Client);
        ActorContext::new(claims.sub, role)
    }
}

/// HS256 verifier for identity provider tokens.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and check a token, expiry included.
    pub fn verify(&self, token: &str) -> AppResult<ActorContext> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized
        })?;
        Ok(data.claims.into())
    }
}

/// Authentication middleware that validates JWT tokens.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&request)?;
    let actor = state.tokens.verify(token)?;

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Extract bearer token from Authorization header.
fn extract_token(request: &Request<Body>) -> AppResult<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Option<&str>, exp: usize) -> (Uuid, String) {
        let sub = Uuid::new_v4();
        let claims = Claims {
            sub,
            role: role.map(str::to_string),
            exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        (sub, token)
    }

    fn in_an_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_claims_become_actor() {
        let verifier = TokenVerifier::new("secret");

        let (sub, admin) = token("secret", Some("admin"), in_an_hour());
        let actor = verifier.verify(&admin).unwrap();
        assert_eq!(actor.profile_id, sub);
        assert!(actor.is_admin());

        let (_, plain) = token("secret", None, in_an_hour());
        assert_eq!(verifier.verify(&plain).unwrap().role, Role::Client);
    }

    #[test]
    fn test_bad_tokens_are_unauthorized() {
        let verifier = TokenVerifier::new("secret");

        let (_, forged) = token("other", Some("admin"), in_an_hour());
        assert!(matches!(verifier.verify(&forged), Err(AppError::Unauthorized)));

        let (_, expired) = token("secret", None, 1_000);
        assert!(matches!(verifier.verify(&expired), Err(AppError::Unauthorized)));

        assert!(matches!(verifier.verify("garbage"), Err(AppError::Unauthorized)));
    }
}
