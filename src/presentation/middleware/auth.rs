//! Authentication Middleware
//!
//! JWT validation for the REST routes, plus the shared token verifier the
//! socket authenticate flow reuses.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;
use crate::startup::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Authenticated user extension
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Decode and validate a JWT, returning the user id from its subject.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let user_id = verify_token(token, &state.settings.jwt.secret)?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-test-secret-test-secret!";

    fn token_for(sub: &str, exp_offset: i64) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_the_subject() {
        let user_id = Uuid::from_u128(7);
        let token = token_for(&user_id.to_string(), 3600);
        assert_eq!(verify_token(&token, SECRET).unwrap(), user_id);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_for(&Uuid::from_u128(7).to_string(), -3600);
        assert!(verify_token(&token, SECRET).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_for(&Uuid::from_u128(7).to_string(), 3600);
        assert!(verify_token(&token, "another-secret-another-secret-!!").is_err());
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let token = token_for("not-a-uuid", 3600);
        assert!(verify_token(&token, SECRET).is_err());
    }
}
