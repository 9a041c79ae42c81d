pub mod auction;
pub mod bidding;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod message_broker;
pub mod scheduler;
