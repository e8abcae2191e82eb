use quotebot_rs::config::BotConfig;
use quotebot_rs::runner::Runner;
use quotebot_rs::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = BotConfig::load()?;

    telemetry::init_tracing("info");
    telemetry::init_metrics(cfg.metrics_port)?;

    tracing::info!(
        symbol = %cfg.symbol,
        target_order_count = cfg.target_order_count,
        max_deviation_percent = cfg.max_deviation_percent,
        "{} baseline {}, {} baseline {}",
        cfg.commodity_asset,
        cfg.commodity_baseline,
        cfg.currency_asset,
        cfg.currency_baseline
    );

    Runner::from_config(&cfg).run().await
}
