// DeversiFi (Bitfinex v2 compatible) REST order book adapter

use reqwest::StatusCode;
use tracing::{debug, instrument};

use super::{BookSource, FeedError, FeedResult};
use crate::market_data::external_book::{OrderBookSnapshot, RawLevel};

pub struct DeversifiClient {
    pub base_url: String,  // "https://api.deversifi.com"
    pub symbol: String,    // e.g. "tETHUSD"
    pub precision: String, // e.g. "P0"
    client: reqwest::Client,
}

impl DeversifiClient {
    pub fn new(base_url: &str, symbol: &str, precision: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol: symbol.to_string(),
            precision: precision.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn book_url(&self) -> String {
        format!("{}/bfx/v2/book/{}/{}", self.base_url, self.symbol, self.precision)
    }
}

/// Decode a `[[price, count, amount], ...]` body into a snapshot.
pub fn decode_book(body: &[u8]) -> FeedResult<OrderBookSnapshot> {
    let levels: Vec<RawLevel> = serde_json::from_slice(body)?;
    Ok(OrderBookSnapshot::from_raw(&levels))
}

#[async_trait::async_trait]
impl BookSource for DeversifiClient {
    #[instrument(skip(self), fields(symbol = %self.symbol))]
    async fn fetch_snapshot(&self) -> FeedResult<OrderBookSnapshot> {
        let res = self.client.get(self.book_url()).send().await?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = res.bytes().await?;
        let book = decode_book(&body)?;
        debug!(bids = book.bids.len(), asks = book.asks.len(), "Fetched order book");
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_url() {
        let client = DeversifiClient::new("https://api.deversifi.com/", "tETHUSD", "P0");
        assert_eq!(client.book_url(), "https://api.deversifi.com/bfx/v2/book/tETHUSD/P0");
    }

    #[test]
    fn test_decode_book() {
        let body = br#"[[1000.5, 2, 5.25], [1000, 1, 1], [1001, 3, -4.5]]"#;
        let book = decode_book(body).unwrap();
        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 1);
        assert_eq!(book.bids[0].price, 1000.5);
        assert_eq!(book.asks[0].amount, 4.5);
        assert_eq!(book.asks[0].count, 3);
    }

    #[test]
    fn test_decode_rejects_non_triples() {
        let err = decode_book(br#"{"error": "rate limited"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));

        let err = decode_book(br#"[[1000, 2]]"#).unwrap_err();
        assert!(matches!(err, FeedError::Decode(_)));
    }

    #[test]
    fn test_status_error_message() {
        assert_eq!(FeedError::Status(503).to_string(), "request error: status code is 503");
    }
}
