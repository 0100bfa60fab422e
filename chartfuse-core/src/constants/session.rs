//! Session Ledger Constants

/// Default number of stable matches retained for confluence queries.
///
/// Oldest matches are dropped first once the ledger is full.
pub const DEFAULT_LEDGER_CAPACITY: usize = 1024;

/// Default look-back window for confluence queries, in milliseconds.
pub const DEFAULT_LOOKBACK_MS: u64 = 5 * 60 * 1000;
