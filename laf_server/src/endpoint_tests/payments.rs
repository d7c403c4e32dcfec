use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use laf_common::{Money, Secret};
use laf_engine::{
    db_types::{PaymentIntent, Role, SettledIntent},
    events::EventProducers,
    SettlementApi,
    SettlementApiError,
    WonAuction,
};
use serde_json::json;

use super::{
    helpers::{get_request, post_request, put_request, token_for},
    mocks::{MockGateway, MockSettlementManager},
};
use crate::{
    gateway::CheckoutSession,
    middleware::HmacMiddlewareFactory,
    routes::{CompletePaymentRoute, CreatePaymentIntentRoute, GatewayCompletePaymentRoute, WonHistoryRoute},
    server::GATEWAY_HMAC_HEADER,
};

const WEBHOOK_SECRET: &str = "6e0db9b1e74c0a2a8fb3c5f4f1a9d315";

#[actix_web::test]
async fn intent_creation_returns_a_checkout_session() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let (status, body) = post_request(&token, "/payments/intents", &json!({ "auction_id": 3, "amount": 1500 }), configure_intents)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""checkout_url":"https://pay.example.com/s/cs_123""#), "unexpected body: {body}");
    assert!(body.contains(r#""payer_id":"bob""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_settled_pair_cannot_start_a_second_payment() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let err = post_request(&token, "/payments/intents", &json!({ "auction_id": 3, "amount": 1500 }), configure_settled_pair)
        .await
        .expect_err("Request should have failed");
    assert_eq!(
        err,
        "The request conflicts with the current state. A settled payment already exists for auction 3 and payer bob"
    );
}

#[actix_web::test]
async fn payers_can_only_settle_their_own_intents() {
    let _ = env_logger::try_init().ok();
    let token = token_for("mallory", vec![Role::User]);
    let err = put_request(&token, "/payments/complete", &json!({ "intent_id": 11 }), configure_settlement)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "Insufficient Permissions. You can only settle your own payments");
}

#[actix_web::test]
async fn the_payer_settles_their_intent() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let (status, body) = put_request(&token, "/payments/complete", &json!({ "intent_id": 11 }), configure_settlement)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""settled":true"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn a_correctly_signed_webhook_settles_the_intent() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "intent_id": 11 }).to_string();
    let signature = crate::helpers::calculate_hmac(WEBHOOK_SECRET, body.as_bytes());
    let (status, body) = webhook_request(Some(&signature), body).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Intent 11 settled"), "unexpected body: {body}");
}

#[actix_web::test]
async fn an_unsigned_webhook_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "intent_id": 11 }).to_string();
    let err = webhook_request(None, body).await.expect_err("Request should have failed");
    assert_eq!(err, "No HMAC signature found.");
}

#[actix_web::test]
async fn a_tampered_webhook_body_is_rejected() {
    let _ = env_logger::try_init().ok();
    let signed_body = json!({ "intent_id": 11 }).to_string();
    let signature = crate::helpers::calculate_hmac(WEBHOOK_SECRET, signed_body.as_bytes());
    let tampered = json!({ "intent_id": 99 }).to_string();
    let err = webhook_request(Some(&signature), tampered).await.expect_err("Request should have failed");
    assert_eq!(err, "Invalid HMAC signature.");
}

#[actix_web::test]
async fn the_won_history_lists_settled_purchases() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let (status, body) = get_request(&token, "/payments/history", configure_history).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""title":"Brown leather wallet""#), "unexpected body: {body}");
    assert!(body.contains(r#""amount":1500"#), "unexpected body: {body}");
}

async fn webhook_request(signature: Option<&str>, body: String) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::put()
        .uri("/payments/complete")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(body);
    if let Some(signature) = signature {
        req = req.insert_header((GATEWAY_HMAC_HEADER, signature));
    }
    let req = req.to_request();
    let hmac = HmacMiddlewareFactory::new(GATEWAY_HMAC_HEADER, Secret::new(WEBHOOK_SECRET.to_string()), true);
    let app = App::new().wrap(hmac).configure(configure_webhook);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

fn configure_intents(cfg: &mut ServiceConfig) {
    let mut settlement_manager = MockSettlementManager::new();
    settlement_manager
        .expect_create_payment_intent()
        .withf(|i| i.payer_id == "bob" && i.auction_id == 3)
        .returning(|_| Ok((intent(false), true)));
    let mut gateway = MockGateway::new();
    gateway.expect_create_checkout().returning(|_| {
        Ok(CheckoutSession {
            session_ref: "cs_123".to_string(),
            checkout_url: "https://pay.example.com/s/cs_123".to_string(),
        })
    });
    cfg.service(CreatePaymentIntentRoute::<MockSettlementManager, MockGateway>::new())
        .app_data(settlement_api(settlement_manager))
        .app_data(web::Data::new(gateway));
}

fn configure_settled_pair(cfg: &mut ServiceConfig) {
    let mut settlement_manager = MockSettlementManager::new();
    settlement_manager.expect_create_payment_intent().returning(|i| {
        Err(SettlementApiError::AlreadySettled { auction_id: i.auction_id, payer_id: i.payer_id })
    });
    let gateway = MockGateway::new();
    cfg.service(CreatePaymentIntentRoute::<MockSettlementManager, MockGateway>::new())
        .app_data(settlement_api(settlement_manager))
        .app_data(web::Data::new(gateway));
}

fn configure_settlement(cfg: &mut ServiceConfig) {
    let mut settlement_manager = MockSettlementManager::new();
    settlement_manager.expect_fetch_payment_intent().returning(|_| Ok(Some(intent(false))));
    settlement_manager.expect_settle_intent().returning(|_| {
        Ok(SettledIntent { intent: intent(true), newly_settled: true, claimed_item: None })
    });
    cfg.service(CompletePaymentRoute::<MockSettlementManager>::new()).app_data(settlement_api(settlement_manager));
}

fn configure_webhook(cfg: &mut ServiceConfig) {
    let mut settlement_manager = MockSettlementManager::new();
    settlement_manager.expect_settle_intent().returning(|_| {
        Ok(SettledIntent { intent: intent(true), newly_settled: true, claimed_item: None })
    });
    cfg.service(GatewayCompletePaymentRoute::<MockSettlementManager>::new())
        .app_data(settlement_api(settlement_manager));
}

fn configure_history(cfg: &mut ServiceConfig) {
    let mut settlement_manager = MockSettlementManager::new();
    settlement_manager.expect_fetch_won_auctions().withf(|payer| payer == "bob").returning(|_| {
        Ok(vec![WonAuction {
            intent_id: 11,
            auction_id: 3,
            found_item_id: 7,
            title: "Brown leather wallet".to_string(),
            short_description: "Brown leather wallet with a broken zip".to_string(),
            amount: Money::from(1500),
            settled_at: Utc.with_ymd_and_hms(2026, 4, 9, 15, 0, 0).unwrap(),
        }])
    });
    cfg.service(WonHistoryRoute::<MockSettlementManager>::new()).app_data(settlement_api(settlement_manager));
}

fn settlement_api(settlement_manager: MockSettlementManager) -> web::Data<SettlementApi<MockSettlementManager>> {
    web::Data::new(SettlementApi::new(settlement_manager, EventProducers::default()))
}

fn intent(settled: bool) -> PaymentIntent {
    let ts = Utc.with_ymd_and_hms(2026, 4, 9, 14, 0, 0).unwrap();
    PaymentIntent {
        id: 11,
        auction_id: 3,
        bid_id: 5,
        payer_id: "bob".to_string(),
        amount: Money::from(1500),
        settled,
        settled_at: settled.then(|| Utc.with_ymd_and_hms(2026, 4, 9, 15, 0, 0).unwrap()),
        created_at: ts,
        updated_at: ts,
    }
}
