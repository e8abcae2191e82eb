use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    BID,
    ASK
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::BID => "BID",
            Side::ASK => "ASK",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Resting order held by the bot; side is implied by the list it lives in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub price: f64,
    pub amount: f64,
}

impl Order {
    pub fn new(price: f64, amount: f64) -> Self {
        Self { price, amount }
    }

    /// Currency value of the order at its own price.
    pub fn total(&self) -> f64 {
        self.amount * self.price
    }
}

// Top of book for one side, read for a single cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestOrder {
    pub price: f64,
    pub amount: f64,
}

// What a sweep decided for a single resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Filled,
    // crossed the market but the ledger refused the withdrawal; dropped
    Rejected,
    Retained,
    Expired,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub filled: usize,
    pub rejected: usize,
    pub retained: usize,
    pub expired: usize,
}

impl SweepReport {
    pub fn record(&mut self, outcome: Settlement) {
        match outcome {
            Settlement::Filled => self.filled += 1,
            Settlement::Rejected => self.rejected += 1,
            Settlement::Retained => self.retained += 1,
            Settlement::Expired => self.expired += 1,
        }
    }

    /// Number of orders classified by the sweep.
    pub fn total(&self) -> usize {
        self.filled + self.rejected + self.retained + self.expired
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub bids_placed: usize,
    pub asks_placed: usize,
    pub bids: SweepReport,
    pub asks: SweepReport,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BotError {
    #[error("order book has no {0} levels")]
    EmptyBookSide(Side),
}
