use tracing::{debug, instrument};

/// Balance of a single asset kept as a baseline plus an append-only log of
/// signed transactions. Nothing is ever removed from the log.
#[derive(Debug, Clone)]
pub struct Ledger {
    asset: String,
    baseline: f64,
    transactions: Vec<f64>,
}

impl Ledger {
    pub fn new(asset: &str, baseline: f64) -> Self {
        Self {
            asset: asset.to_string(),
            baseline,
            transactions: Vec::new(),
        }
    }

    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn transactions(&self) -> &[f64] {
        &self.transactions
    }

    pub fn balance(&self) -> f64 {
        self.baseline + self.transactions.iter().sum::<f64>()
    }

    pub fn can_withdraw(&self, amount: f64) -> bool {
        self.balance() - amount >= 0.0
    }

    /// Records `-amount` if the resulting balance stays non-negative.
    /// Returns `false` and leaves the log untouched otherwise.
    #[instrument(level = "trace", skip(self), fields(asset = %self.asset))]
    pub fn withdraw(&mut self, amount: f64) -> bool {
        if !self.can_withdraw(amount) {
            debug!(asset = %self.asset, amount, balance = self.balance(), "Withdrawal refused");
            return false;
        }
        self.transactions.push(-amount);
        true
    }

    #[instrument(level = "trace", skip(self), fields(asset = %self.asset))]
    pub fn deposit(&mut self, amount: f64) {
        self.transactions.push(amount);
    }
}
