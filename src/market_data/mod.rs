// Market data module entrypoint
pub mod adapters;      // order book sources (e.g. DeversiFi REST)
pub mod external_book; // snapshot of the external book, best level first
