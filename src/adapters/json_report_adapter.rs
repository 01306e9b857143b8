//! JSON report adapter.
//!
//! Serializes the whole result (trades, equity history, summary) to a
//! single JSON file with camelCase field names, the same shape an API
//! caller would receive.

use crate::domain::engine::BacktestResult;
use crate::domain::error::TradesimError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output: &Path) -> Result<(), TradesimError> {
        let json =
            serde_json::to_string_pretty(result).map_err(|e| TradesimError::Report {
                reason: e.to_string(),
            })?;
        fs::write(output, json)?;
        Ok(())
    }
}
