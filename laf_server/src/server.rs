use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use laf_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AuctionApi,
    ItemFlowApi,
    SettlementApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    gateway::HttpCheckoutGateway,
    middleware::{HmacMiddlewareFactory, JwtMiddlewareFactory},
    routes::{
        health,
        BidHistoryRoute,
        CloseLostReportRoute,
        CompletePaymentRoute,
        CreateAuctionRoute,
        CreateLostReportRoute,
        CreatePaymentIntentRoute,
        DeleteLostReportRoute,
        EndAuctionRoute,
        FoundItemRoute,
        FoundItemsRoute,
        GatewayCompletePaymentRoute,
        HighestBidRoute,
        ListAuctionsRoute,
        LostReportRoute,
        OpenLostReportsRoute,
        PlaceBidRoute,
        RegisterDeliveryRoute,
        RegisterFoundItemRoute,
        SearchFoundItemsRoute,
        StartAuctionRoute,
        UpdateLostReportRoute,
        WonHistoryRoute,
    },
};

/// The header the checkout gateway places its webhook signature in.
pub const GATEWAY_HMAC_HEADER: &str = "X-Gateway-Hmac-SHA256";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Logging subscribers for the engine's event hooks. Notification delivery proper is out of scope; these make the
/// events visible in the logs.
fn configure_event_handlers() -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks
        .on_report_matched(|ev| {
            Box::pin(async move {
                info!("📬️ Lost report #{} was matched by found item #{}", ev.report.id, ev.item.id);
            })
        })
        .on_bid_placed(|ev| {
            Box::pin(async move {
                info!("📬️ Bid of {} placed on auction #{}", ev.bid.amount, ev.bid.auction_id);
            })
        })
        .on_intent_settled(|ev| {
            Box::pin(async move {
                info!("📬️ Payment intent #{} settled for auction #{}", ev.intent.id, ev.intent.auction_id);
            })
        });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();
    producers
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let producers = configure_event_handlers();
    let gateway = HttpCheckoutGateway::new(&config.gateway)?;
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let items_api = ItemFlowApi::new(db.clone(), config.match_criteria(), producers.clone());
        let auctions_api = AuctionApi::new(db.clone(), producers.clone());
        let settlement_api = SettlementApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("laf::access_log"))
            .app_data(web::Data::new(items_api))
            .app_data(web::Data::new(auctions_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(gateway.clone()));
        // Routes that require authentication
        let api_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(config.auth.jwt_secret.clone()))
            .service(CreateLostReportRoute::<SqliteDatabase>::new())
            .service(OpenLostReportsRoute::<SqliteDatabase>::new())
            .service(LostReportRoute::<SqliteDatabase>::new())
            .service(UpdateLostReportRoute::<SqliteDatabase>::new())
            .service(DeleteLostReportRoute::<SqliteDatabase>::new())
            .service(CloseLostReportRoute::<SqliteDatabase>::new())
            .service(RegisterFoundItemRoute::<SqliteDatabase>::new())
            .service(FoundItemsRoute::<SqliteDatabase>::new())
            // The search route must register before the {id} route, or "search" is parsed as an id
            .service(SearchFoundItemsRoute::<SqliteDatabase>::new())
            .service(FoundItemRoute::<SqliteDatabase>::new())
            .service(RegisterDeliveryRoute::<SqliteDatabase>::new())
            .service(CreateAuctionRoute::<SqliteDatabase>::new())
            .service(StartAuctionRoute::<SqliteDatabase>::new())
            .service(EndAuctionRoute::<SqliteDatabase>::new())
            .service(PlaceBidRoute::<SqliteDatabase>::new())
            .service(BidHistoryRoute::<SqliteDatabase>::new())
            .service(HighestBidRoute::<SqliteDatabase>::new())
            .service(CreatePaymentIntentRoute::<SqliteDatabase, HttpCheckoutGateway>::new())
            .service(CompletePaymentRoute::<SqliteDatabase>::new())
            .service(WonHistoryRoute::<SqliteDatabase>::new());
        // The gateway webhook authenticates with an HMAC signature instead of a user token
        let webhook_scope = web::scope("/gateway")
            .wrap(HmacMiddlewareFactory::new(
                GATEWAY_HMAC_HEADER,
                config.gateway.hmac_secret.clone(),
                config.gateway.hmac_checks,
            ))
            .service(GatewayCompletePaymentRoute::<SqliteDatabase>::new());
        app.service(health).service(ListAuctionsRoute::<SqliteDatabase>::new()).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
