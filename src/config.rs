use std::time::Duration;

use anyhow::{ensure, Context};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "QUOTEBOT";

/// Runtime settings. Every field has a built-in default and can be
/// overridden with a `QUOTEBOT_<FIELD>` environment variable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BotConfig {
    pub commodity_asset: String,
    pub currency_asset: String,
    pub commodity_baseline: f64,
    pub currency_baseline: f64,
    // resting orders kept per side
    pub target_order_count: usize,
    // bounds both order generation and expiry
    pub max_deviation_percent: f64,
    pub refresh_interval_secs: u64,
    pub report_interval_secs: u64,
    pub feed_base_url: String,
    pub symbol: String,
    pub precision: String,
    pub metrics_port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            commodity_asset: "ETH".into(),
            currency_asset: "USD".into(),
            commodity_baseline: 10.0,
            currency_baseline: 2000.0,
            target_order_count: 5,
            max_deviation_percent: 5.0,
            refresh_interval_secs: 5,
            report_interval_secs: 30,
            feed_base_url: "https://api.deversifi.com".into(),
            symbol: "tETHUSD".into(),
            precision: "P0".into(),
            metrics_port: 9000,
        }
    }
}

impl BotConfig {
    /// Load `.env` if present, then layer the process environment over the defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    pub fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let cfg: BotConfig = config::Config::builder()
            .set_default("commodity_asset", defaults.commodity_asset)?
            .set_default("currency_asset", defaults.currency_asset)?
            .set_default("commodity_baseline", defaults.commodity_baseline)?
            .set_default("currency_baseline", defaults.currency_baseline)?
            .set_default("target_order_count", defaults.target_order_count as i64)?
            .set_default("max_deviation_percent", defaults.max_deviation_percent)?
            .set_default("refresh_interval_secs", defaults.refresh_interval_secs as i64)?
            .set_default("report_interval_secs", defaults.report_interval_secs as i64)?
            .set_default("feed_base_url", defaults.feed_base_url)?
            .set_default("symbol", defaults.symbol)?
            .set_default("precision", defaults.precision)?
            .set_default("metrics_port", defaults.metrics_port as i64)?
            .add_source(source)
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.max_deviation_percent.is_finite() && self.max_deviation_percent > 0.0,
            "max_deviation_percent must be a positive number, got {}",
            self.max_deviation_percent
        );
        ensure!(self.target_order_count > 0, "target_order_count must be at least 1");
        ensure!(self.refresh_interval_secs > 0, "refresh_interval_secs must be positive");
        ensure!(self.report_interval_secs > 0, "report_interval_secs must be positive");
        ensure!(
            self.commodity_baseline.is_finite() && self.currency_baseline.is_finite(),
            "baselines must be finite"
        );
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}
