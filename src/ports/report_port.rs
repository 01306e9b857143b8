//! Result report generation port trait.

use crate::domain::engine::BacktestResult;
use crate::domain::error::TradesimError;
use std::path::Path;

/// Port for writing backtest results to disk.
///
/// Adapters decide how `output` is interpreted: a directory for multi-file
/// formats, a single file otherwise.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output: &Path) -> Result<(), TradesimError>;
}
