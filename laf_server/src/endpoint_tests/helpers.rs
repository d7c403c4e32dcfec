use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{Days, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use laf_common::Secret;
use laf_engine::db_types::Role;
use log::debug;
use serde::Serialize;

use crate::{auth::JwtClaims, config::AuthConfig, middleware::JwtMiddlewareFactory};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("925842e11914fdd0c9a2ab8a38dac9de57b3e392372cde1661b1a84b1d8e430e".into()) }
}

pub fn issue_token(claims: JwtClaims) -> String {
    let config = get_auth_config();
    let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    encode(&Header::default(), &claims, &key).expect("Failed to sign token")
}

/// A token for `sub`, carrying the given roles and expiring tomorrow.
pub fn token_for(sub: &str, roles: Vec<Role>) -> String {
    let exp = (Utc::now() + Days::new(1)).timestamp();
    issue_token(JwtClaims { sub: sub.to_string(), roles: roles.into(), exp })
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth(TestRequest::get().uri(path), auth_header);
    send_request(req, configure).await
}

pub async fn post_request<T: Serialize>(
    auth_header: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth(TestRequest::post().uri(path).set_json(body), auth_header);
    send_request(req, configure).await
}

pub async fn put_request<T: Serialize>(
    auth_header: &str,
    path: &str,
    body: &T,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth(TestRequest::put().uri(path).set_json(body), auth_header);
    send_request(req, configure).await
}

pub async fn delete_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = with_auth(TestRequest::delete().uri(path), auth_header);
    send_request(req, configure).await
}

fn with_auth(req: TestRequest, auth_header: &str) -> TestRequest {
    if auth_header.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {auth_header}")))
    }
}

async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = req.to_request();
    let config = get_auth_config();
    let app = App::new().wrap(JwtMiddlewareFactory::new(config.jwt_secret)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Calls a route that is registered outside of the authenticated scope, so no token middleware is applied.
pub async fn public_get_request(
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
