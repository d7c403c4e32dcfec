pub mod auction_api;
pub mod item_flow_api;
pub mod objects;
pub mod settlement_api;
