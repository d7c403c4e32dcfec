//! The identity boundary.
//!
//! Users authenticate against an external identity provider, which issues HS256-signed JWTs with a shared secret.
//! The server never issues tokens itself; it only verifies them and trusts the embedded subject and roles.
//!
//! Verified claims are inserted into the request extensions by [`crate::middleware::JwtMiddlewareFactory`], from
//! where handlers extract them via the [`actix_web::FromRequest`] impl on [`JwtClaims`].

use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpMessage, HttpRequest};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use laf_common::Secret;
use laf_engine::db_types::Roles;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The subject id assigned by the identity provider. All ownership checks compare against this value.
    pub sub: String,
    pub roles: Roles,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Verifies the signature and expiry of a bearer token and returns its claims.
pub fn validate_token(token: &str, secret: &Secret<String>) -> Result<JwtClaims, AuthError> {
    let key = DecodingKey::from_secret(secret.reveal().as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<JwtClaims>(token, &key, &validation)
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;
    debug!("Access token validated for subject {}", data.claims.sub);
    Ok(data.claims)
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn extract_bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".to_string()))
}

impl FromRequest for JwtClaims {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(AuthError::MissingToken);
        ready(claims)
    }
}

impl actix_web::error::ResponseError for AuthError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AuthError::MissingToken | AuthError::ValidationError(_) | AuthError::PoorlyFormattedToken(_) => {
                StatusCode::UNAUTHORIZED
            },
            AuthError::InsufficientPermissions(_) | AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code())
            .insert_header(actix_web::http::header::ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
