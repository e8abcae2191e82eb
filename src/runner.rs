// Runner wires the feed, the bot and the two ledgers together and drives
// the refresh/report timers.
use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::engine::ledger::Ledger;
use crate::engine::market_maker::MarketMaker;
use crate::engine::types::CycleReport;
use crate::market_data::adapters::deversifi::DeversifiClient;
use crate::market_data::adapters::BookSource;
use crate::telemetry;

pub struct Runner<S, R = StdRng> {
    source: S,
    bot: MarketMaker<R>,
    refresh_interval: Duration,
    report_interval: Duration,
}

impl Runner<DeversifiClient, StdRng> {
    pub fn from_config(cfg: &BotConfig) -> Self {
        let commodity = Ledger::new(&cfg.commodity_asset, cfg.commodity_baseline);
        let currency = Ledger::new(&cfg.currency_asset, cfg.currency_baseline);
        let bot = MarketMaker::new(commodity, currency, cfg.target_order_count, cfg.max_deviation_percent);
        let source = DeversifiClient::new(&cfg.feed_base_url, &cfg.symbol, &cfg.precision);

        Self::new(source, bot, cfg.refresh_interval(), cfg.report_interval())
    }
}

impl<S: BookSource, R: Rng> Runner<S, R> {
    pub fn new(source: S, bot: MarketMaker<R>, refresh_interval: Duration, report_interval: Duration) -> Self {
        Self { source, bot, refresh_interval, report_interval }
    }

    pub fn bot(&self) -> &MarketMaker<R> {
        &self.bot
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch one snapshot and run the bot against it. Any failure skips the
    /// cycle with a warning and leaves the bot untouched.
    pub async fn run_cycle(&mut self) -> Option<CycleReport> {
        let book = match self.source.fetch_snapshot().await {
            Ok(book) => book,
            Err(e) => {
                warn!(error = %e, "Order book fetch failed, skipping cycle");
                metrics::counter!("quotebot_cycles_skipped_total").increment(1);
                return None;
            }
        };

        match self.bot.run_cycle(&book) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Unusable order book, skipping cycle");
                metrics::counter!("quotebot_cycles_skipped_total").increment(1);
                None
            }
        }
    }

    pub fn report_balances(&self) {
        telemetry::report_balances(&[self.bot.commodity(), self.bot.currency()]);
    }

    /// Run cycles until `shutdown` resolves. A cycle starts right away and the
    /// next one is scheduled `refresh_interval` after the previous finished,
    /// so cycles never overlap. Balances are reported every `report_interval`
    /// and once more on the way out.
    pub async fn run_until<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        let mut report = tokio::time::interval_at(Instant::now() + self.report_interval, self.report_interval);
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let next_cycle = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(next_cycle);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = &mut next_cycle => {
                    self.run_cycle().await;
                    next_cycle.as_mut().reset(Instant::now() + self.refresh_interval);
                }
                _ = report.tick() => self.report_balances(),
            }
        }

        self.report_balances();
        self
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!(
            refresh_secs = self.refresh_interval.as_secs(),
            report_secs = self.report_interval.as_secs(),
            "Starting quote bot"
        );
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{BotError, Order, Side};
    use crate::market_data::adapters::{FeedError, FeedResult};
    use crate::market_data::external_book::{BookLevel, OrderBookSnapshot};
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // Replays queued responses, then keeps answering with the fallback book
    struct ScriptedSource {
        queue: Mutex<VecDeque<FeedResult<OrderBookSnapshot>>>,
        fallback: OrderBookSnapshot,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(queue: Vec<FeedResult<OrderBookSnapshot>>, fallback: OrderBookSnapshot) -> Self {
            Self { queue: Mutex::new(queue.into()), fallback, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl BookSource for ScriptedSource {
        async fn fetch_snapshot(&self) -> FeedResult<OrderBookSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.queue.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    fn book(bid: f64, ask: f64) -> OrderBookSnapshot {
        OrderBookSnapshot::new(
            vec![BookLevel { price: bid, count: 1, amount: 5.0 }],
            vec![BookLevel { price: ask, count: 1, amount: 5.0 }],
        )
    }

    fn runner(queue: Vec<FeedResult<OrderBookSnapshot>>) -> Runner<ScriptedSource> {
        let bot = MarketMaker::with_rng(
            Ledger::new("ETH", 10.0),
            Ledger::new("USD", 2000.0),
            5,
            5.0,
            StdRng::seed_from_u64(42),
        );
        Runner::new(
            ScriptedSource::new(queue, book(1000.0, 1010.0)),
            bot,
            Duration::from_secs(5),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_cycle_places_orders() {
        let mut runner = runner(vec![]);
        let report = runner.run_cycle().await.unwrap();

        assert_eq!(report.bids_placed, 5);
        assert_eq!(report.asks_placed, 5);
        assert_eq!(runner.bot().orders(Side::BID).len(), 5);
        assert_eq!(runner.bot().orders(Side::ASK).len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_skips_cycle() {
        let mut runner = runner(vec![Err(FeedError::Status(502))]);

        assert!(runner.run_cycle().await.is_none());
        assert!(runner.bot().bids.is_empty());
        assert!(runner.bot().asks.is_empty());

        // next tick retries from the same state
        assert!(runner.run_cycle().await.is_some());
        assert_eq!(runner.source().calls(), 2);
    }

    #[tokio::test]
    async fn test_one_sided_book_skips_cycle() {
        let one_sided = OrderBookSnapshot::new(vec![BookLevel { price: 1000.0, count: 1, amount: 5.0 }], vec![]);
        let mut runner = runner(vec![Ok(one_sided.clone())]);

        assert!(runner.run_cycle().await.is_none());
        assert!(runner.bot().bids.is_empty());
        assert_eq!(
            runner.bot.run_cycle(&one_sided).unwrap_err(),
            BotError::EmptyBookSide(Side::ASK)
        );
    }

    #[tokio::test]
    async fn test_bid_fill_across_cycles() {
        let mut runner = runner(vec![Ok(book(1000.0, 1010.0))]);
        runner.bot.bids = vec![Order::new(1100.0, 1.0)];

        let report = runner.run_cycle().await.unwrap();

        // placement tops up to 5, then the 1100 bid crosses the 1000 best bid
        assert_eq!(report.bids_placed, 4);
        assert_eq!(report.bids.filled, 1);
        assert_eq!(runner.bot().commodity().balance(), 11.0);
        assert_eq!(runner.bot().currency().balance(), 900.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_schedules_cycles_back_to_back() {
        let runner = runner(vec![]);
        let runner = runner.run_until(tokio::time::sleep(Duration::from_secs(12))).await;

        // cycles at t = 0s, 5s and 10s
        assert_eq!(runner.source().calls(), 3);
        assert_eq!(runner.bot().orders(Side::BID).len(), 5);
    }
}
