//! Client for the external checkout gateway.
//!
//! The settlement flow hands the winning amount and an intent reference to the gateway, which hosts the actual
//! payment page. The gateway reports the outcome back via the signed webhook (see
//! [`crate::middleware::HmacMiddlewareFactory`]) or the user's return to the success callback.

use std::sync::Arc;

use laf_common::EURO_CURRENCY_CODE;
use laf_engine::db_types::PaymentIntent;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not initialize the gateway client. {0}")]
    Initialization(String),
    #[error("The gateway rejected the request: {status} {message}")]
    RequestFailed { status: u16, message: String },
    #[error("Could not reach the gateway. {0}")]
    Unreachable(String),
    #[error("Could not decode the gateway response. {0}")]
    JsonError(String),
}

/// A hosted checkout session created at the gateway for one payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// The gateway's own reference for the session.
    pub session_ref: String,
    /// Where to send the payer to complete payment.
    pub checkout_url: String,
}

#[derive(Debug, Clone, Serialize)]
struct NewCheckoutRequest {
    intent_id: i64,
    amount_cents: i64,
    currency: &'static str,
    description: String,
}

/// The gateway operations the settlement routes need. Mocked out in endpoint tests.
#[allow(async_fn_in_trait)]
pub trait CheckoutGateway {
    async fn create_checkout(&self, intent: &PaymentIntent) -> Result<CheckoutSession, GatewayError>;
}

#[derive(Clone)]
pub struct HttpCheckoutGateway {
    base_url: String,
    client: Arc<Client>,
}

impl HttpCheckoutGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { base_url: config.base_url.clone(), client: Arc::new(client) })
    }
}

impl CheckoutGateway for HttpCheckoutGateway {
    async fn create_checkout(&self, intent: &PaymentIntent) -> Result<CheckoutSession, GatewayError> {
        let url = format!("{}/checkout_sessions", self.base_url);
        trace!("Creating checkout session at {url} for intent #{}", intent.id);
        let body = NewCheckoutRequest {
            intent_id: intent.id,
            amount_cents: intent.amount.value(),
            currency: EURO_CURRENCY_CODE,
            description: format!("Auction #{} settlement", intent.auction_id),
        };
        let response =
            self.client.post(url).json(&body).send().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            trace!("Checkout session created. {}", response.status());
            response.json::<CheckoutSession>().await.map_err(|e| GatewayError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            Err(GatewayError::RequestFailed { status, message })
        }
    }
}
