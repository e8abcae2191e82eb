use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use crate::engine::ledger::Ledger;
use crate::engine::types::{BestOrder, BotError, CycleReport, Order, Settlement, Side, SweepReport};
use crate::market_data::external_book::OrderBookSnapshot;

/// Keeps `target_order_count` resting orders on each side around the best
/// price of the external book and settles them against two ledgers.
///
/// Placement never looks at the ledgers. Affordability is only checked when an
/// order crosses the market, through `Ledger::withdraw`.
#[derive(Debug)]
pub struct MarketMaker<R = StdRng> {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
    commodity: Ledger,
    currency: Ledger,
    target_order_count: usize,
    max_deviation_percent: f64,
    rng: R,
}

impl MarketMaker<StdRng> {
    pub fn new(commodity: Ledger, currency: Ledger, target_order_count: usize, max_deviation_percent: f64) -> Self {
        Self::with_rng(commodity, currency, target_order_count, max_deviation_percent, StdRng::from_entropy())
    }
}

impl<R: Rng> MarketMaker<R> {
    pub fn with_rng(
        commodity: Ledger,
        currency: Ledger,
        target_order_count: usize,
        max_deviation_percent: f64,
        rng: R,
    ) -> Self {
        Self {
            bids: Vec::new(),
            asks: Vec::new(),
            commodity,
            currency,
            target_order_count,
            max_deviation_percent,
            rng,
        }
    }

    pub fn commodity(&self) -> &Ledger {
        &self.commodity
    }

    pub fn currency(&self) -> &Ledger {
        &self.currency
    }

    pub fn target_order_count(&self) -> usize {
        self.target_order_count
    }

    pub fn max_deviation_percent(&self) -> f64 {
        self.max_deviation_percent
    }

    pub fn orders(&self, side: Side) -> &[Order] {
        match side {
            Side::BID => &self.bids,
            Side::ASK => &self.asks,
        }
    }

    fn orders_mut(&mut self, side: Side) -> &mut Vec<Order> {
        match side {
            Side::BID => &mut self.bids,
            Side::ASK => &mut self.asks,
        }
    }

    // Uniform in [0, max_deviation_percent / 100)
    fn deviate(&mut self) -> f64 {
        let bound = self.max_deviation_percent / 100.0;
        if bound > 0.0 && bound.is_finite() {
            self.rng.gen_range(0.0..bound)
        } else {
            0.0
        }
    }

    /// Top up one side to `target_order_count` orders priced off `best`.
    /// Bids go below the best price, asks above it; amounts always go above
    /// the best amount. Returns the whole side after placement.
    #[instrument(level = "debug", skip(self))]
    pub fn place_orders(&mut self, side: Side, best: &BestOrder) -> &[Order] {
        let deficit = self.target_order_count.saturating_sub(self.orders(side).len());

        for _ in 0..deficit {
            let offset = self.deviate() * best.price;
            let price = match side {
                Side::BID => best.price - offset,
                Side::ASK => best.price + offset,
            };
            let amount = best.amount + self.deviate() * best.amount;

            self.orders_mut(side).push(Order::new(price, amount));
            metrics::counter!("quotebot_orders_placed_total", "side" => side.as_str()).increment(1);
            info!(side = %side, price, amount, "PLACE order");
        }

        self.orders(side)
    }

    pub fn place_bids(&mut self, book: &OrderBookSnapshot) -> Result<&[Order], BotError> {
        let best = book.best_bid().ok_or(BotError::EmptyBookSide(Side::BID))?;
        Ok(self.place_orders(Side::BID, &best))
    }

    pub fn place_asks(&mut self, book: &OrderBookSnapshot) -> Result<&[Order], BotError> {
        let best = book.best_ask().ok_or(BotError::EmptyBookSide(Side::ASK))?;
        Ok(self.place_orders(Side::ASK, &best))
    }

    /// Returns how many (bids, asks) were created.
    pub fn place_bids_and_asks(&mut self, book: &OrderBookSnapshot) -> Result<(usize, usize), BotError> {
        let (best_bid, best_ask) = best_pair(book)?;

        let bids_before = self.bids.len();
        let bids_placed = self.place_orders(Side::BID, &best_bid).len() - bids_before;
        let asks_before = self.asks.len();
        let asks_placed = self.place_orders(Side::ASK, &best_ask).len() - asks_before;

        Ok((bids_placed, asks_placed))
    }

    // Decide the fate of a single resting order and apply its ledger effects.
    fn settle(&mut self, side: Side, order: &Order, best: &BestOrder) -> Settlement {
        let total = order.total();

        match side {
            Side::BID => {
                if order.price > best.price {
                    if !self.currency.withdraw(total) {
                        return Settlement::Rejected;
                    }
                    self.commodity.deposit(order.amount);
                    info!(
                        "FILLED BID @ {} ({} + {} {} - {})",
                        order.price,
                        self.commodity.asset(),
                        order.amount,
                        self.currency.asset(),
                        total
                    );
                    Settlement::Filled
                } else {
                    let deviation = (best.price - order.price) / best.price * 100.0;
                    self.retain_or_expire(deviation)
                }
            }
            Side::ASK => {
                if order.price < best.price {
                    if !self.commodity.withdraw(order.amount) {
                        return Settlement::Rejected;
                    }
                    self.currency.deposit(total);
                    info!(
                        "FILLED ASK @ {} ({} - {} {} + {})",
                        order.price,
                        self.commodity.asset(),
                        order.amount,
                        self.currency.asset(),
                        total
                    );
                    Settlement::Filled
                } else {
                    let deviation = (order.price - best.price) / order.price * 100.0;
                    self.retain_or_expire(deviation)
                }
            }
        }
    }

    fn retain_or_expire(&self, deviation_percent: f64) -> Settlement {
        if deviation_percent < self.max_deviation_percent {
            Settlement::Retained
        } else {
            Settlement::Expired
        }
    }

    /// Sweep one side against `best`. Every resting order is filled, rejected,
    /// retained or expired exactly once; only retained orders stay on the side.
    #[instrument(level = "debug", skip(self))]
    pub fn fill_orders(&mut self, side: Side, best: &BestOrder) -> SweepReport {
        let resting = std::mem::take(self.orders_mut(side));
        let mut remaining = Vec::with_capacity(resting.len());
        let mut report = SweepReport::default();

        for order in resting {
            let outcome = self.settle(side, &order, best);
            match outcome {
                Settlement::Filled => {
                    metrics::counter!("quotebot_orders_filled_total", "side" => side.as_str()).increment(1);
                }
                Settlement::Rejected => {
                    metrics::counter!("quotebot_orders_rejected_total", "side" => side.as_str()).increment(1);
                    debug!(side = %side, price = order.price, amount = order.amount, "Dropped order, insufficient funds");
                }
                Settlement::Expired => {
                    metrics::counter!("quotebot_orders_expired_total", "side" => side.as_str()).increment(1);
                    debug!(side = %side, price = order.price, best = best.price, "Expired order");
                }
                Settlement::Retained => remaining.push(order),
            }
            report.record(outcome);
        }

        *self.orders_mut(side) = remaining;
        report
    }

    pub fn fill_bids(&mut self, book: &OrderBookSnapshot) -> Result<SweepReport, BotError> {
        let best = book.best_bid().ok_or(BotError::EmptyBookSide(Side::BID))?;
        Ok(self.fill_orders(Side::BID, &best))
    }

    pub fn fill_asks(&mut self, book: &OrderBookSnapshot) -> Result<SweepReport, BotError> {
        let best = book.best_ask().ok_or(BotError::EmptyBookSide(Side::ASK))?;
        Ok(self.fill_orders(Side::ASK, &best))
    }

    pub fn fill_bids_and_asks(&mut self, book: &OrderBookSnapshot) -> Result<(SweepReport, SweepReport), BotError> {
        let (best_bid, best_ask) = best_pair(book)?;
        Ok((self.fill_orders(Side::BID, &best_bid), self.fill_orders(Side::ASK, &best_ask)))
    }

    /// One refresh: place missing orders then settle both sides against the
    /// same snapshot. A book missing either side is rejected before anything
    /// is touched.
    pub fn run_cycle(&mut self, book: &OrderBookSnapshot) -> Result<CycleReport, BotError> {
        let (bids_placed, asks_placed) = self.place_bids_and_asks(book)?;
        let (bids, asks) = self.fill_bids_and_asks(book)?;

        let report = CycleReport { bids_placed, asks_placed, bids, asks };
        debug!(?report, "Cycle complete");
        Ok(report)
    }
}

fn best_pair(book: &OrderBookSnapshot) -> Result<(BestOrder, BestOrder), BotError> {
    let best_bid = book.best_bid().ok_or(BotError::EmptyBookSide(Side::BID))?;
    let best_ask = book.best_ask().ok_or(BotError::EmptyBookSide(Side::ASK))?;
    Ok((best_bid, best_ask))
}
