use serde::{Deserialize, Serialize};

use crate::engine::types::{BestOrder, Side};

// One price level as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub count: u64,
    pub amount: f64, // always positive once normalised
}

// Wire format: [price, count, amount], amount sign encodes the side
pub type RawLevel = (f64, u64, f64);

/// Snapshot of the external book, best level first on each side.
/// Only element `[0]` of each side is ever consulted by the bot.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn new(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> Self {
        Self { bids, asks }
    }

    // Positive amounts are bids, everything else is an ask stored by magnitude.
    // Feed ordering is kept as-is.
    pub fn from_raw(levels: &[RawLevel]) -> Self {
        let mut book = Self::default();
        for &(price, count, amount) in levels {
            if amount > 0.0 {
                book.bids.push(BookLevel { price, count, amount });
            } else {
                book.asks.push(BookLevel { price, count, amount: amount.abs() });
            }
        }
        book
    }

    pub fn best(&self, side: Side) -> Option<BestOrder> {
        let levels = match side {
            Side::BID => &self.bids,
            Side::ASK => &self.asks,
        };
        levels.first().map(|l| BestOrder { price: l.price, amount: l.amount })
    }

    pub fn best_bid(&self) -> Option<BestOrder> {
        self.best(Side::BID)
    }

    pub fn best_ask(&self) -> Option<BestOrder> {
        self.best(Side::ASK)
    }

    pub fn bbo(&self) -> (Option<BestOrder>, Option<BestOrder>) {
        (self.best_bid(), self.best_ask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_partitions_by_sign() {
        let raw = vec![
            (1000.0, 2, 5.0),
            (999.5, 1, 0.25),
            (1001.0, 3, -4.0),
            (1002.0, 1, -0.5),
        ];
        let book = OrderBookSnapshot::from_raw(&raw);

        assert_eq!(book.bids.len(), 2);
        assert_eq!(book.asks.len(), 2);
        assert_eq!(book.bids[0], BookLevel { price: 1000.0, count: 2, amount: 5.0 });
        assert_eq!(book.asks[0], BookLevel { price: 1001.0, count: 3, amount: 4.0 });
        assert_eq!(book.asks[1].amount, 0.5);
    }

    #[test]
    fn test_zero_amount_lands_on_ask_side() {
        let book = OrderBookSnapshot::from_raw(&[(1000.0, 1, 0.0)]);
        assert!(book.bids.is_empty());
        assert_eq!(book.asks.len(), 1);
    }

    #[test]
    fn test_bbo_reads_first_level() {
        let book = OrderBookSnapshot::from_raw(&[
            (1000.0, 2, 5.0),
            (900.0, 2, 4.0),
            (1010.0, 1, -3.0),
        ]);
        let (bid, ask) = book.bbo();
        assert_eq!(bid, Some(BestOrder { price: 1000.0, amount: 5.0 }));
        assert_eq!(ask, Some(BestOrder { price: 1010.0, amount: 3.0 }));
    }

    #[test]
    fn test_empty_side_has_no_best() {
        let book = OrderBookSnapshot::from_raw(&[(1000.0, 2, 5.0)]);
        assert!(book.best_bid().is_some());
        assert_eq!(book.best_ask(), None);
    }
}
