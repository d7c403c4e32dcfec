//! # Lost-and-Found server
//! This module hosts the HTTP surface for the lost-and-found platform. It is responsible for:
//! * Verifying identity-provider access tokens and enforcing role-based access control.
//! * Exposing the lost-report, found-item, auction, bid and payment routes.
//! * Receiving signed payment confirmations from the checkout gateway.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Authenticated routes live under `/api` and require a `Authorization: Bearer <token>` header. The public surface
//! is `/health`, the `/auctions` listing, and the HMAC-signed `/gateway` webhook.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
