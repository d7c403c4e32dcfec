use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Auction, Bid, NewAuction, NewBid},
    events::{BidPlacedEvent, EventProducers},
    laf_api::objects::AuctionWindow,
    traits::{AuctionApiError, AuctionManagement},
};

/// `AuctionApi` owns the auction lifecycle and fronts the bid ledger.
pub struct AuctionApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for AuctionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuctionApi")
    }
}

impl<B> AuctionApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> AuctionApi<B>
where B: AuctionManagement
{
    /// Creates an auction for a found item. At most one auction may ever exist per item; a second create is a
    /// conflict.
    pub async fn create_auction(&self, auction: NewAuction) -> Result<Auction, AuctionApiError> {
        if auction.start_date > auction.end_date {
            return Err(AuctionApiError::ValidationError("start_date must not be after end_date".to_string()));
        }
        let auction = self.db.create_auction(auction).await?;
        info!("🔄️🔨️ Auction #{} created for found item #{}", auction.id, auction.found_item_id);
        Ok(auction)
    }

    pub async fn auction(&self, id: i64) -> Result<Option<Auction>, AuctionApiError> {
        self.db.fetch_auction(id).await
    }

    pub async fn auctions_in_window(&self, window: AuctionWindow) -> Result<Vec<Auction>, AuctionApiError> {
        self.db.fetch_auctions_in_window(window).await
    }

    pub async fn start_auction(&self, id: i64) -> Result<Auction, AuctionApiError> {
        let auction = self.db.start_auction(id).await?;
        info!("🔄️🔨️ Auction #{id} started");
        Ok(auction)
    }

    pub async fn end_auction(&self, id: i64) -> Result<Auction, AuctionApiError> {
        let auction = self.db.end_auction(id).await?;
        info!("🔄️🔨️ Auction #{id} ended at {}", auction.end_date);
        Ok(auction)
    }

    /// Submits a bid to the ledger. Acceptance is atomic with the floor check, so a successful return means the bid
    /// strictly exceeded every previously accepted bid at the moment it was written.
    pub async fn place_bid(&self, bid: NewBid) -> Result<Bid, AuctionApiError> {
        let bid = self.db.place_bid(bid).await?;
        debug!("🔄️🔨️ Bid #{} of {} accepted on auction #{}", bid.id, bid.amount, bid.auction_id);
        self.call_bid_placed_hook(&bid).await;
        Ok(bid)
    }

    async fn call_bid_placed_hook(&self, bid: &Bid) {
        for emitter in &self.producers.bid_placed_producer {
            debug!("🔄️🔨️ Notifying bid-placed hook subscribers");
            let event = BidPlacedEvent::new(bid.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn bid_history(&self, auction_id: i64) -> Result<Vec<Bid>, AuctionApiError> {
        self.db.fetch_bids(auction_id).await
    }

    /// The current winning bid. `Ok(None)` means the auction exists but has no bids yet; the route layer turns that
    /// into a 404 per the API contract.
    pub async fn highest_bid(&self, auction_id: i64) -> Result<Option<Bid>, AuctionApiError> {
        self.db.fetch_highest_bid(auction_id).await
    }
}
