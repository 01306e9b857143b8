//! Historical bar access port trait.

use crate::domain::bar::Bar;
use crate::domain::error::TradesimError;
use chrono::NaiveDateTime;

/// Synchronous provider of historical bars.
///
/// `fetch_bars` must return bars ascending by datetime; the engine relies
/// on that ordering. Transient failures are returned as errors, never
/// retried here; retry policy belongs to the implementation.
pub trait DataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError>;

    /// Most recent bars for a symbol, newest first, capped at `limit`.
    fn latest_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, TradesimError>;

    /// First timestamp, last timestamp and bar count for a symbol, or None
    /// when nothing is stored.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError>;
}
