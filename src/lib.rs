//! Simulated market-making bot.
//!
//! Each cycle the bot reads the top of an external order book, tops up its own
//! resting bids and asks around the best prices and settles them against two
//! in-memory ledgers (a commodity and a currency).

pub mod config;
pub mod engine;
pub mod market_data;
pub mod runner;
pub mod telemetry;
