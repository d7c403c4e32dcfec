//! Bearer-token middleware.
//!
//! Wrap a scope with this middleware to require a valid access token from the identity provider. The verified
//! [`JwtClaims`] are inserted into the request extensions where the [`super::AclMiddlewareService`] and the
//! `FromRequest` impl on [`JwtClaims`] pick them up. Requests without a valid token are rejected with 401.

use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use laf_common::Secret;
use log::debug;

use crate::auth::{extract_bearer_token, validate_token, JwtClaims};

pub struct JwtMiddlewareFactory {
    secret: Secret<String>,
}

impl JwtMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        Box::pin(async move {
            let token = extract_bearer_token(req.request())?;
            let claims: JwtClaims = validate_token(&token, &secret)?;
            debug!("🔐️ Request authenticated for subject {}", claims.sub);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
