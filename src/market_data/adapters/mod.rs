// Shared trait + error for order book sources

use thiserror::Error;

use crate::market_data::external_book::OrderBookSnapshot;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request error: status code is {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed order book payload: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;

#[async_trait::async_trait]
pub trait BookSource: Send + Sync {
    // One attempt per call; retrying is left to the caller's next tick.
    async fn fetch_snapshot(&self) -> FeedResult<OrderBookSnapshot>;
}

pub mod deversifi;
