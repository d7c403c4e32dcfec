//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions, which get executed
//! concurrently by the worker threads.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use laf_engine::{
    db_types::{NewBid, NewPaymentIntent, Role},
    traits::{AuctionManagement, ItemManagement, SettlementManagement},
    AuctionApi,
    AuctionWindow,
    FoundItemSearchFilter,
    ItemFlowApi,
    SettlementApi,
};
use log::*;

use crate::{
    auth::JwtClaims,
    data_objects::{
        AuctionRequest,
        AuctionStatusQuery,
        BidRequest,
        CheckoutResponse,
        DeliveryRequest,
        FoundItemRequest,
        JsonResponse,
        LostReportRequest,
        LostReportUpdateRequest,
        PaymentCompleteRequest,
        PaymentIntentRequest,
        SearchQuery,
    },
    errors::ServerError,
    gateway::CheckoutGateway,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:ty),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Lost reports  ----------------------------------------------------
route!(create_lost_report => Post "/reports" impl ItemManagement where requires [Role::User]);
/// Route handler for filing a new lost report.
///
/// Any authenticated user can file a report. The owner of the report is always the token subject; a body-supplied
/// owner would allow filing reports in someone else's name.
pub async fn create_lost_report<B: ItemManagement>(
    claims: JwtClaims,
    body: web::Json<LostReportRequest>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST lost report for {}", claims.sub);
    let report = api.create_lost_report(body.into_inner().into_new_report(&claims.sub)).await?;
    Ok(HttpResponse::Created().json(report))
}

route!(open_lost_reports => Get "/reports" impl ItemManagement);
pub async fn open_lost_reports<B: ItemManagement>(
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET open lost reports");
    let reports = api.open_lost_reports().await?;
    Ok(HttpResponse::Ok().json(reports))
}

route!(lost_report => Get "/reports/{id}" impl ItemManagement);
pub async fn lost_report<B: ItemManagement>(
    path: web::Path<i64>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET lost report #{id}");
    let report =
        api.lost_report(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Lost report {id}")))?;
    Ok(HttpResponse::Ok().json(report))
}

route!(close_lost_report => Post "/reports/{id}/close" impl ItemManagement);
/// Route handler for closing a lost report.
///
/// The reporting user can close their own report; an authority member can close anyone's. Everyone else gets a 403.
pub async fn close_lost_report<B: ItemManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST close lost report #{id} by {}", claims.sub);
    let report = api.close_lost_report(id, &claims.sub, claims.roles.is_authority()).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(update_lost_report => Put "/reports/{id}" impl ItemManagement);
/// Route handler for editing a lost report.
///
/// The reporting user can edit their own report; an authority member can edit anyone's. Closed reports are immutable.
pub async fn update_lost_report<B: ItemManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<LostReportUpdateRequest>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ PUT lost report #{id} by {}", claims.sub);
    let report =
        api.update_lost_report(id, body.into_inner().into(), &claims.sub, claims.roles.is_authority()).await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(delete_lost_report => Delete "/reports/{id}" impl ItemManagement);
/// Route handler for deleting a lost report outright. Same permission rule as editing.
pub async fn delete_lost_report<B: ItemManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ DELETE lost report #{id} by {}", claims.sub);
    api.delete_lost_report(id, &claims.sub, claims.roles.is_authority()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Lost report {id} deleted"))))
}

//----------------------------------------------   Found items  ----------------------------------------------------
route!(register_found_item => Post "/items/found" impl ItemManagement where requires [Role::Authority]);
/// Route handler for registering a found item.
///
/// Only authority members can register items. Registration runs the reconciliation matcher; the response carries
/// both the stored item and the lost report that was matched and closed, if any.
pub async fn register_found_item<B: ItemManagement>(
    claims: JwtClaims,
    body: web::Json<FoundItemRequest>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST found item by {}", claims.sub);
    let (item, matched) = api.register_found_item(body.into_inner().into_new_item(&claims.sub)).await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "item": item, "matched_report": matched })))
}

route!(found_items => Get "/items/found" impl ItemManagement where requires [Role::Authority]);
pub async fn found_items<B: ItemManagement>(api: web::Data<ItemFlowApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET found items");
    let items = api.found_items().await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(search_found_items => Get "/items/found/search" impl ItemManagement where requires [Role::Authority]);
pub async fn search_found_items<B: ItemManagement>(
    query: web::Query<SearchQuery>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET found item search");
    let mut filter = FoundItemSearchFilter::default();
    filter.title = query.title;
    filter.short_description = query.short_description;
    filter.category = query.category;
    let items = api.search_found_items(filter).await?;
    Ok(HttpResponse::Ok().json(items))
}

route!(found_item => Get "/items/found/{id}" impl ItemManagement where requires [Role::Authority]);
pub async fn found_item<B: ItemManagement>(
    path: web::Path<i64>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET found item #{id}");
    let item = api.found_item(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Found item {id}")))?;
    Ok(HttpResponse::Ok().json(item))
}

route!(register_delivery => Post "/items/found/{id}/deliver" impl ItemManagement where requires [Role::Authority]);
/// Route handler for handing a found item back to its owner outside of an auction.
pub async fn register_delivery<B: ItemManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<DeliveryRequest>,
    api: web::Data<ItemFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let body = body.into_inner();
    debug!("💻️ POST delivery of found item #{id} by {}", claims.sub);
    let delivery_date = body.delivery_date.unwrap_or_else(Utc::now);
    let item = api.register_delivery(id, &body.owner_id, delivery_date).await?;
    Ok(HttpResponse::Ok().json(item))
}

//----------------------------------------------   Auctions  ----------------------------------------------------
route!(list_auctions => Get "/auctions" impl AuctionManagement);
/// Route handler for the public auction listing.
///
/// `status` selects the window bucket (`active`, `upcoming` or `past`) and defaults to `active`. This endpoint is
/// unauthenticated so that prospective bidders can browse before logging in.
pub async fn list_auctions<B: AuctionManagement>(
    query: web::Query<AuctionStatusQuery>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = query.into_inner().status.unwrap_or_else(|| "active".to_string());
    debug!("💻️ GET auctions [{status}]");
    let window = AuctionWindow::from_str(&status).map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    let auctions = api.auctions_in_window(window).await?;
    Ok(HttpResponse::Ok().json(auctions))
}

route!(create_auction => Post "/auctions" impl AuctionManagement where requires [Role::Authority]);
pub async fn create_auction<B: AuctionManagement>(
    claims: JwtClaims,
    body: web::Json<AuctionRequest>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST auction by {}", claims.sub);
    let auction = api.create_auction(body.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(auction))
}

route!(start_auction => Post "/auctions/{id}/start" impl AuctionManagement where requires [Role::Authority]);
pub async fn start_auction<B: AuctionManagement>(
    path: web::Path<i64>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST start auction #{id}");
    let auction = api.start_auction(id).await?;
    Ok(HttpResponse::Ok().json(auction))
}

route!(end_auction => Post "/auctions/{id}/end" impl AuctionManagement where requires [Role::Authority]);
pub async fn end_auction<B: AuctionManagement>(
    path: web::Path<i64>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ POST end auction #{id}");
    let auction = api.end_auction(id).await?;
    Ok(HttpResponse::Ok().json(auction))
}

route!(place_bid => Post "/auctions/{id}/bid" impl AuctionManagement where requires [Role::User]);
/// Route handler for submitting a bid.
///
/// The bidder is always the token subject. An accepted bid strictly exceeded every previously accepted bid at the
/// moment it hit the ledger; a bid that equals or undercuts the floor comes back as a 409 naming the current floor.
pub async fn place_bid<B: AuctionManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<BidRequest>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let auction_id = path.into_inner();
    debug!("💻️ POST bid on auction #{auction_id} by {}", claims.sub);
    let bid = NewBid { auction_id, bidder_id: claims.sub, amount: body.into_inner().amount };
    let bid = api.place_bid(bid).await?;
    Ok(HttpResponse::Created().json(bid))
}

route!(bid_history => Get "/auctions/{id}/bids" impl AuctionManagement where requires [Role::User]);
pub async fn bid_history<B: AuctionManagement>(
    path: web::Path<i64>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let auction_id = path.into_inner();
    debug!("💻️ GET bid history for auction #{auction_id}");
    let bids = api.bid_history(auction_id).await?;
    Ok(HttpResponse::Ok().json(bids))
}

route!(highest_bid => Get "/auctions/{id}/highest-bid" impl AuctionManagement where requires [Role::User]);
/// Route handler for the current winning bid. A bid-less auction is a 404, not an empty response.
pub async fn highest_bid<B: AuctionManagement>(
    path: web::Path<i64>,
    api: web::Data<AuctionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let auction_id = path.into_inner();
    debug!("💻️ GET highest bid for auction #{auction_id}");
    let bid = api
        .highest_bid(auction_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No bids on auction {auction_id}")))?;
    Ok(HttpResponse::Ok().json(bid))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment_intent => Post "/payments/intents" impl SettlementManagement, CheckoutGateway where requires [Role::User]);
/// Route handler for starting the payment of a won auction.
///
/// Creates (or idempotently returns) the pending intent for the winning bid, then opens a hosted checkout session at
/// the gateway and hands the payer the redirect URL. Reloading the checkout page re-enters here safely.
pub async fn create_payment_intent<B: SettlementManagement, G: CheckoutGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentIntentRequest>,
    api: web::Data<SettlementApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError> {
    let body = body.into_inner();
    debug!("💻️ POST payment intent for auction #{} by {}", body.auction_id, claims.sub);
    let intent = NewPaymentIntent { auction_id: body.auction_id, payer_id: claims.sub, amount: body.amount };
    let intent = api.create_payment_intent(intent).await?;
    let checkout = gateway.create_checkout(&intent).await?;
    Ok(HttpResponse::Created().json(CheckoutResponse { intent, checkout }))
}

route!(complete_payment => Put "/payments/complete" impl SettlementManagement where requires [Role::User]);
/// Route handler for the payer-side settlement callback.
///
/// The gateway redirects the payer here after a successful payment. Settlement is idempotent, so a refresh of the
/// success page changes nothing. Payers can only settle their own intents.
pub async fn complete_payment<B: SettlementManagement>(
    claims: JwtClaims,
    body: web::Json<PaymentCompleteRequest>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let intent_id = body.into_inner().intent_id;
    debug!("💻️ PUT complete payment for intent #{intent_id} by {}", claims.sub);
    let intent = api
        .payment_intent(intent_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Payment intent {intent_id}")))?;
    if intent.payer_id != claims.sub && !claims.roles.is_authority() {
        return Err(ServerError::InsufficientPermissions("You can only settle your own payments".to_string()));
    }
    let intent = api.settle_intent(intent_id).await?;
    Ok(HttpResponse::Ok().json(intent))
}

route!(gateway_complete_payment => Put "/payments/complete" impl SettlementManagement);
/// Route handler for the gateway-side settlement webhook.
///
/// Authenticated by the HMAC signature over the raw body (see the middleware wrapping this route in
/// [`crate::server`]), not by a user token. Redeliveries of the same confirmation are no-ops.
pub async fn gateway_complete_payment<B: SettlementManagement>(
    body: web::Json<PaymentCompleteRequest>,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let intent_id = body.into_inner().intent_id;
    debug!("💻️ PUT gateway confirmation for intent #{intent_id}");
    match api.settle_intent(intent_id).await {
        Ok(_) => Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Intent {intent_id} settled")))),
        Err(e) => {
            warn!("💻️ Gateway confirmation for intent #{intent_id} failed. {e}");
            Err(e.into())
        },
    }
}

route!(won_history => Get "/payments/history" impl SettlementManagement where requires [Role::User]);
/// Route handler for the "bought at auction" history of the calling user.
pub async fn won_history<B: SettlementManagement>(
    claims: JwtClaims,
    api: web::Data<SettlementApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET won auctions for {}", claims.sub);
    let won = api.won_auctions(&claims.sub).await?;
    Ok(HttpResponse::Ok().json(won))
}
