use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use laf_engine::{
    db_types::{FoundItem, LostReport, Role},
    events::EventProducers,
    matcher::MatchCriteria,
    ItemFlowApi,
};
use serde_json::json;

use super::{
    helpers::{delete_request, get_request, post_request, put_request, token_for},
    mocks::MockItemManager,
};
use crate::routes::{
    CloseLostReportRoute,
    CreateLostReportRoute,
    DeleteLostReportRoute,
    LostReportRoute,
    OpenLostReportsRoute,
    RegisterFoundItemRoute,
    UpdateLostReportRoute,
};

#[actix_web::test]
async fn reports_require_a_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/reports", configure_reports).await.expect_err("Expected error");
    assert_eq!(err, "No access token was provided.");
}

#[actix_web::test]
async fn tampered_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = token_for("alice", vec![Role::User]);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let err = get_request(&token, "/reports", configure_reports).await.expect_err("Expected error");
    assert!(err.starts_with("Access token signature is invalid."), "unexpected error: {err}");
}

#[actix_web::test]
async fn filing_a_report_takes_the_owner_from_the_token() {
    let _ = env_logger::try_init().ok();
    let token = token_for("alice", vec![Role::User]);
    let (status, body) =
        post_request(&token, "/reports", &report_body(), configure_reports).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""owner_id":"alice""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn filing_a_report_requires_the_user_role() {
    let _ = env_logger::try_init().ok();
    let token = token_for("stranger", vec![]);
    let err = post_request(&token, "/reports", &report_body(), configure_reports)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn a_missing_report_is_a_404() {
    let _ = env_logger::try_init().ok();
    let token = token_for("alice", vec![Role::User]);
    let err = get_request(&token, "/reports/42", configure_missing_report)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "The data was not found. Lost report 42");
}

#[actix_web::test]
async fn closing_someone_elses_report_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = token_for("mallory", vec![Role::User]);
    let err = post_request(&token, "/reports/1/close", &json!({}), configure_close_forbidden)
        .await
        .expect_err("Request should have failed");
    assert_eq!(
        err,
        "Insufficient Permissions. Operation not permitted. Only the reporting user or an authority may close this \
         report"
    );
}

#[actix_web::test]
async fn editing_a_report_passes_the_token_subject() {
    let _ = env_logger::try_init().ok();
    let token = token_for("alice", vec![Role::User]);
    let body = json!({ "title": "Lost dark brown wallet" });
    let (status, body) =
        put_request(&token, "/reports/1", &body, configure_edit).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""title":"Lost dark brown wallet""#), "unexpected body: {body}");
}

#[actix_web::test]
async fn deleting_someone_elses_report_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = token_for("mallory", vec![Role::User]);
    let err = delete_request(&token, "/reports/1", configure_edit).await.expect_err("Request should have failed");
    assert_eq!(err, "Insufficient Permissions. Operation not permitted. Only the reporting user may delete report #1");
}

#[actix_web::test]
async fn registering_a_found_item_requires_the_authority_role() {
    let _ = env_logger::try_init().ok();
    let token = token_for("alice", vec![Role::User]);
    let err = post_request(&token, "/items/found", &item_body(), configure_registration)
        .await
        .expect_err("Request should have failed");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn registration_returns_the_matched_report() {
    let _ = env_logger::try_init().ok();
    let token = token_for("psp-017", vec![Role::Authority]);
    let (status, body) =
        post_request(&token, "/items/found", &item_body(), configure_registration).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.contains(r#""matched_report":{"#), "unexpected body: {body}");
    assert!(body.contains(r#""owner_id":"alice""#), "unexpected body: {body}");
}

fn configure_reports(cfg: &mut ServiceConfig) {
    let mut item_manager = MockItemManager::new();
    item_manager.expect_fetch_open_lost_reports().returning(|| Ok(vec![lost_report()]));
    item_manager.expect_insert_lost_report().withf(|r| r.owner_id == "alice").returning(|r| {
        let mut report = lost_report();
        report.owner_id = r.owner_id;
        Ok(report)
    });
    cfg.service(OpenLostReportsRoute::<MockItemManager>::new())
        .service(CreateLostReportRoute::<MockItemManager>::new())
        .app_data(item_api(item_manager));
}

fn configure_missing_report(cfg: &mut ServiceConfig) {
    let mut item_manager = MockItemManager::new();
    item_manager.expect_fetch_lost_report().returning(|_| Ok(None));
    cfg.service(LostReportRoute::<MockItemManager>::new()).app_data(item_api(item_manager));
}

fn configure_close_forbidden(cfg: &mut ServiceConfig) {
    let mut item_manager = MockItemManager::new();
    item_manager.expect_close_lost_report().returning(|_, _, _| {
        Err(laf_engine::ItemApiError::Forbidden(
            "Only the reporting user or an authority may close this report".to_string(),
        ))
    });
    cfg.service(CloseLostReportRoute::<MockItemManager>::new()).app_data(item_api(item_manager));
}

fn configure_edit(cfg: &mut ServiceConfig) {
    let mut item_manager = MockItemManager::new();
    item_manager
        .expect_update_lost_report()
        .withf(|_, _, subject, is_authority| subject == "alice" && !is_authority)
        .returning(|_, update, _, _| {
            let mut report = lost_report();
            if let Some(title) = update.title {
                report.title = title;
            }
            Ok(report)
        });
    item_manager.expect_delete_lost_report().withf(|_, subject, _| subject == "mallory").returning(|id, _, _| {
        Err(laf_engine::ItemApiError::Forbidden(format!("Only the reporting user may delete report #{id}")))
    });
    cfg.service(UpdateLostReportRoute::<MockItemManager>::new())
        .service(DeleteLostReportRoute::<MockItemManager>::new())
        .app_data(item_api(item_manager));
}

fn configure_registration(cfg: &mut ServiceConfig) {
    let mut item_manager = MockItemManager::new();
    item_manager.expect_register_found_item().returning(|_, _| Ok((found_item(), Some(lost_report()))));
    cfg.service(RegisterFoundItemRoute::<MockItemManager>::new()).app_data(item_api(item_manager));
}

fn item_api(item_manager: MockItemManager) -> web::Data<ItemFlowApi<MockItemManager>> {
    web::Data::new(ItemFlowApi::new(item_manager, MatchCriteria::default(), EventProducers::default()))
}

fn report_body() -> serde_json::Value {
    json!({
        "title": "Brown leather wallet",
        "short_description": "Brown leather wallet with a broken zip",
        "full_description": "Lost near the fountain on the main square. Contains a library card",
        "category": "accessories",
        "lost_at": "2026-03-01T09:00:00Z",
        "location": { "lat": 38.70775, "lon": -9.13659 }
    })
}

fn item_body() -> serde_json::Value {
    json!({
        "title": "Brown leather wallet",
        "short_description": "Brown leather wallet with a broken zip",
        "full_description": "Handed in at the precinct desk",
        "category": "accessories",
        "found_at": "2026-03-02T10:30:00Z",
        "location": { "lat": 38.70776, "lon": -9.13660 },
        "claim_deadline": "2026-09-02T10:30:00Z",
        "base_value": 1000
    })
}

fn lost_report() -> LostReport {
    let ts = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    LostReport {
        id: 1,
        title: "Brown leather wallet".to_string(),
        short_description: "Brown leather wallet with a broken zip".to_string(),
        full_description: "Lost near the fountain on the main square. Contains a library card".to_string(),
        category: "accessories".to_string(),
        lost_at: ts,
        latitude: 38.70775,
        longitude: -9.13659,
        owner_id: "alice".to_string(),
        active: true,
        created_at: ts,
        updated_at: ts,
    }
}

fn found_item() -> FoundItem {
    let ts = Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap();
    FoundItem {
        id: 7,
        title: "Brown leather wallet".to_string(),
        short_description: "Brown leather wallet with a broken zip".to_string(),
        full_description: "Handed in at the precinct desk".to_string(),
        category: "accessories".to_string(),
        found_at: ts,
        latitude: 38.70776,
        longitude: -9.13660,
        claim_deadline: Utc.with_ymd_and_hms(2026, 9, 2, 10, 30, 0).unwrap(),
        active: true,
        base_value: Some(laf_common::Money::from(1000)),
        image_url: None,
        registered_by: "psp-017".to_string(),
        claimant_id: None,
        claimed_at: None,
        created_at: ts,
        updated_at: ts,
    }
}
