//! Route handler tests against mock backends.
//!
//! Every test builds a minimal app with the routes under test, the middleware they rely on and a mockall-backed
//! engine, so no database is needed. See `helpers` for token issuance and request plumbing.

mod helpers;
mod mocks;

mod auctions;
mod payments;
mod reports;
