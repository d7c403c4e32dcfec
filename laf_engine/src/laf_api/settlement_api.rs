use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewPaymentIntent, PaymentIntent, SettledIntent},
    events::{EventProducers, IntentSettledEvent},
    laf_api::objects::WonAuction,
    traits::{SettlementApiError, SettlementManagement},
};

/// `SettlementApi` drives the two-phase payment protocol: intent creation before checkout, settlement on gateway
/// confirmation. Both phases are idempotent and safe to retry.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SettlementApi<B>
where B: SettlementManagement
{
    /// Creates (or idempotently returns) the pending payment intent for the winning bid of an auction. Reloading a
    /// checkout page re-enters here and receives the same intent id.
    pub async fn create_payment_intent(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, SettlementApiError> {
        let payer = intent.payer_id.clone();
        let (intent, created) = self.db.create_payment_intent(intent).await?;
        if created {
            info!("🔄️💳️ Payment intent #{} created for auction #{} by {payer}", intent.id, intent.auction_id);
        } else {
            debug!("🔄️💳️ Returning existing unsettled intent #{} for auction #{}", intent.id, intent.auction_id);
        }
        Ok(intent)
    }

    pub async fn payment_intent(&self, id: i64) -> Result<Option<PaymentIntent>, SettlementApiError> {
        self.db.fetch_payment_intent(id).await
    }

    /// Settles an intent after the gateway confirms payment. Exactly one state transition ever happens per intent;
    /// duplicate confirmations (webhook redelivery, user refresh) are no-ops returning the settled state.
    pub async fn settle_intent(&self, id: i64) -> Result<PaymentIntent, SettlementApiError> {
        let SettledIntent { intent, newly_settled, claimed_item } = self.db.settle_intent(id).await?;
        if newly_settled {
            info!("🔄️💳️ Payment intent #{id} settled; auction #{} is paid for", intent.auction_id);
            self.call_intent_settled_hook(&intent, claimed_item).await;
        } else {
            debug!("🔄️💳️ Payment intent #{id} was already settled; treating the call as a no-op");
        }
        Ok(intent)
    }

    async fn call_intent_settled_hook(&self, intent: &PaymentIntent, claimed_item: Option<crate::db_types::FoundItem>) {
        for emitter in &self.producers.intent_settled_producer {
            debug!("🔄️💳️ Notifying intent-settled hook subscribers");
            let event = IntentSettledEvent::new(intent.clone(), claimed_item.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn won_auctions(&self, payer_id: &str) -> Result<Vec<WonAuction>, SettlementApiError> {
        self.db.fetch_won_auctions(payer_id).await
    }
}
