use chrono::{DateTime, Utc};
use laf_engine::{
    db_types::{
        Auction,
        Bid,
        FoundItem,
        LostReport,
        NewAuction,
        NewBid,
        NewFoundItem,
        NewLostReport,
        NewPaymentIntent,
        PaymentIntent,
        SettledIntent,
        UpdateLostReport,
    },
    matcher::MatchCriteria,
    traits::{
        AuctionApiError,
        AuctionManagement,
        ItemApiError,
        ItemManagement,
        SettlementApiError,
        SettlementManagement,
    },
    AuctionWindow,
    FoundItemSearchFilter,
    WonAuction,
};
use mockall::mock;

use crate::gateway::{CheckoutGateway, CheckoutSession, GatewayError};

mock! {
    pub ItemManager {}
    impl ItemManagement for ItemManager {
        async fn insert_lost_report(&self, report: NewLostReport) -> Result<LostReport, ItemApiError>;
        async fn fetch_lost_report(&self, id: i64) -> Result<Option<LostReport>, ItemApiError>;
        async fn fetch_open_lost_reports(&self) -> Result<Vec<LostReport>, ItemApiError>;
        async fn close_lost_report(&self, id: i64, subject: &str, is_authority: bool) -> Result<LostReport, ItemApiError>;
        async fn update_lost_report(&self, id: i64, update: UpdateLostReport, subject: &str, is_authority: bool) -> Result<LostReport, ItemApiError>;
        async fn delete_lost_report(&self, id: i64, subject: &str, is_authority: bool) -> Result<(), ItemApiError>;
        async fn register_found_item(&self, item: NewFoundItem, criteria: &MatchCriteria) -> Result<(FoundItem, Option<LostReport>), ItemApiError>;
        async fn fetch_found_item(&self, id: i64) -> Result<Option<FoundItem>, ItemApiError>;
        async fn fetch_found_items(&self) -> Result<Vec<FoundItem>, ItemApiError>;
        async fn search_found_items(&self, filter: FoundItemSearchFilter) -> Result<Vec<FoundItem>, ItemApiError>;
        async fn register_delivery(&self, item_id: i64, owner_id: &str, delivery_date: DateTime<Utc>) -> Result<FoundItem, ItemApiError>;
    }
}

mock! {
    pub AuctionManager {}
    impl AuctionManagement for AuctionManager {
        async fn create_auction(&self, auction: NewAuction) -> Result<Auction, AuctionApiError>;
        async fn fetch_auction(&self, id: i64) -> Result<Option<Auction>, AuctionApiError>;
        async fn fetch_auctions_in_window(&self, window: AuctionWindow) -> Result<Vec<Auction>, AuctionApiError>;
        async fn start_auction(&self, id: i64) -> Result<Auction, AuctionApiError>;
        async fn end_auction(&self, id: i64) -> Result<Auction, AuctionApiError>;
        async fn place_bid(&self, bid: NewBid) -> Result<Bid, AuctionApiError>;
        async fn fetch_bids(&self, auction_id: i64) -> Result<Vec<Bid>, AuctionApiError>;
        async fn fetch_highest_bid(&self, auction_id: i64) -> Result<Option<Bid>, AuctionApiError>;
    }
}

mock! {
    pub SettlementManager {}
    impl SettlementManagement for SettlementManager {
        async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<(PaymentIntent, bool), SettlementApiError>;
        async fn fetch_payment_intent(&self, id: i64) -> Result<Option<PaymentIntent>, SettlementApiError>;
        async fn settle_intent(&self, id: i64) -> Result<SettledIntent, SettlementApiError>;
        async fn fetch_won_auctions(&self, payer_id: &str) -> Result<Vec<WonAuction>, SettlementApiError>;
    }
}

mock! {
    pub Gateway {}
    impl CheckoutGateway for Gateway {
        async fn create_checkout(&self, intent: &PaymentIntent) -> Result<CheckoutSession, GatewayError>;
    }
}
