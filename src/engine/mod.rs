pub mod ledger;
pub mod market_maker;
pub mod types;

pub use ledger::Ledger;
pub use market_maker::MarketMaker;
pub use types::*;
