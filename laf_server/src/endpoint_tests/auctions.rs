use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use laf_common::Money;
use laf_engine::{
    db_types::{Auction, Bid, Role},
    events::EventProducers,
    AuctionApi,
    AuctionApiError,
    AuctionWindow,
};
use serde_json::json;

use super::{
    helpers::{get_request, post_request, public_get_request, token_for},
    mocks::MockAuctionManager,
};
use crate::routes::{CreateAuctionRoute, HighestBidRoute, ListAuctionsRoute, PlaceBidRoute};

#[actix_web::test]
async fn the_auction_listing_is_public() {
    let _ = env_logger::try_init().ok();
    let (status, body) = public_get_request("/auctions?status=past", configure_listing).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""found_item_id":7"#), "unexpected body: {body}");
}

#[actix_web::test]
async fn the_listing_defaults_to_active_auctions() {
    let _ = env_logger::try_init().ok();
    let (status, body) = public_get_request("/auctions", configure_listing).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[actix_web::test]
async fn an_unknown_status_bucket_is_a_400() {
    let _ = env_logger::try_init().ok();
    let err = public_get_request("/auctions?status=bogus", configure_listing)
        .await
        .expect_err("Request should have failed");
    assert_eq!(
        err,
        "Could not read request path: Invalid auction status: bogus. Expected one of 'active', 'upcoming' or 'past'"
    );
}

#[actix_web::test]
async fn creating_an_auction_requires_the_authority_role() {
    let _ = env_logger::try_init().ok();
    let token = token_for("alice", vec![Role::User]);
    let err = post_request(&token, "/auctions", &auction_body(), configure_create)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn a_second_auction_for_the_same_item_is_a_conflict() {
    let _ = env_logger::try_init().ok();
    let token = token_for("psp-017", vec![Role::Authority]);
    let err = post_request(&token, "/auctions", &auction_body(), configure_create)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "The request conflicts with the current state. An auction already exists for found item 7");
}

#[actix_web::test]
async fn the_bidder_is_always_the_token_subject() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let (status, body) =
        post_request(&token, "/auctions/3/bid", &json!({ "amount": 1500 }), configure_bidding)
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""bidder_id":"bob""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn an_undercutting_bid_is_a_conflict_naming_the_floor() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let err = post_request(&token, "/auctions/3/bid", &json!({ "amount": 100 }), configure_low_bid)
        .await
        .expect_err("Request should have failed");
    assert!(err.starts_with("The request conflicts with the current state. Bid too low."), "unexpected error: {err}");
}

#[actix_web::test]
async fn the_highest_bid_of_a_bidless_auction_is_a_404() {
    let _ = env_logger::try_init().ok();
    let token = token_for("bob", vec![Role::User]);
    let err = get_request(&token, "/auctions/3/highest-bid", configure_no_bids)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "The data was not found. No bids on auction 3");
}

fn configure_listing(cfg: &mut ServiceConfig) {
    let mut auction_manager = MockAuctionManager::new();
    auction_manager.expect_fetch_auctions_in_window().returning(|window| match window {
        AuctionWindow::Past => Ok(vec![auction()]),
        _ => Ok(vec![]),
    });
    cfg.service(ListAuctionsRoute::<MockAuctionManager>::new()).app_data(auction_api(auction_manager));
}

fn configure_create(cfg: &mut ServiceConfig) {
    let mut auction_manager = MockAuctionManager::new();
    auction_manager.expect_create_auction().returning(|_| Err(AuctionApiError::AuctionAlreadyExists(7)));
    cfg.service(CreateAuctionRoute::<MockAuctionManager>::new()).app_data(auction_api(auction_manager));
}

fn configure_bidding(cfg: &mut ServiceConfig) {
    let mut auction_manager = MockAuctionManager::new();
    auction_manager.expect_place_bid().withf(|b| b.bidder_id == "bob" && b.auction_id == 3).returning(|b| {
        Ok(Bid {
            id: 1,
            auction_id: b.auction_id,
            bidder_id: b.bidder_id,
            amount: b.amount,
            placed_at: Utc::now(),
        })
    });
    cfg.service(PlaceBidRoute::<MockAuctionManager>::new()).app_data(auction_api(auction_manager));
}

fn configure_low_bid(cfg: &mut ServiceConfig) {
    let mut auction_manager = MockAuctionManager::new();
    auction_manager.expect_place_bid().returning(|_| Err(AuctionApiError::BidTooLow { floor: Money::from(1500) }));
    cfg.service(PlaceBidRoute::<MockAuctionManager>::new()).app_data(auction_api(auction_manager));
}

fn configure_no_bids(cfg: &mut ServiceConfig) {
    let mut auction_manager = MockAuctionManager::new();
    auction_manager.expect_fetch_highest_bid().returning(|_| Ok(None));
    cfg.service(HighestBidRoute::<MockAuctionManager>::new()).app_data(auction_api(auction_manager));
}

fn auction_api(auction_manager: MockAuctionManager) -> web::Data<AuctionApi<MockAuctionManager>> {
    web::Data::new(AuctionApi::new(auction_manager, EventProducers::default()))
}

fn auction_body() -> serde_json::Value {
    json!({
        "found_item_id": 7,
        "start_date": "2026-04-01T10:00:00Z",
        "end_date": "2026-04-08T10:00:00Z",
        "location": "Municipal depot, hall B",
        "base_value": 1000
    })
}

fn auction() -> Auction {
    let ts = Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap();
    Auction {
        id: 3,
        found_item_id: 7,
        start_date: ts,
        end_date: Utc.with_ymd_and_hms(2026, 2, 8, 10, 0, 0).unwrap(),
        location: "Municipal depot, hall B".to_string(),
        base_value: Money::from(1000),
        active: true,
        created_at: ts,
        updated_at: ts,
    }
}
