use std::sync::Arc;

use crate::events::{BidPlacedEvent, EventHandler, EventProducer, Handler, IntentSettledEvent, ReportMatchedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub report_matched_producer: Vec<EventProducer<ReportMatchedEvent>>,
    pub bid_placed_producer: Vec<EventProducer<BidPlacedEvent>>,
    pub intent_settled_producer: Vec<EventProducer<IntentSettledEvent>>,
}

pub struct EventHandlers {
    pub on_report_matched: Option<EventHandler<ReportMatchedEvent>>,
    pub on_bid_placed: Option<EventHandler<BidPlacedEvent>>,
    pub on_intent_settled: Option<EventHandler<IntentSettledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_report_matched = hooks.on_report_matched.map(|f| EventHandler::new(buffer_size, f));
        let on_bid_placed = hooks.on_bid_placed.map(|f| EventHandler::new(buffer_size, f));
        let on_intent_settled = hooks.on_intent_settled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_report_matched, on_bid_placed, on_intent_settled }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_report_matched {
            result.report_matched_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_bid_placed {
            result.bid_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_intent_settled {
            result.intent_settled_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns the handler tasks. Must be called from within a tokio runtime.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_report_matched {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_bid_placed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_intent_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_report_matched: Option<Handler<ReportMatchedEvent>>,
    pub on_bid_placed: Option<Handler<BidPlacedEvent>>,
    pub on_intent_settled: Option<Handler<IntentSettledEvent>>,
}

impl EventHooks {
    pub fn on_report_matched<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReportMatchedEvent) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>)
            + Send
            + Sync
            + 'static {
        self.on_report_matched = Some(Arc::new(f));
        self
    }

    pub fn on_bid_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BidPlacedEvent) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>)
            + Send
            + Sync
            + 'static {
        self.on_bid_placed = Some(Arc::new(f));
        self
    }

    pub fn on_intent_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(IntentSettledEvent) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>)
            + Send
            + Sync
            + 'static {
        self.on_intent_settled = Some(Arc::new(f));
        self
    }
}
