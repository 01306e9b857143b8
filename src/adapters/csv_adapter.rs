//! CSV file bar adapter.
//!
//! One file per symbol (`SOFI.csv`) with a header row and
//! `datetime,open,high,low,close,volume` columns. The datetime column takes
//! `YYYY-MM-DD HH:MM:SS` or a bare `YYYY-MM-DD` (read as midnight, i.e. a
//! daily bar). Also used as the input side of the `import` command.

use crate::domain::bar::Bar;
use crate::domain::error::TradesimError;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_all(&self, symbol: &str) -> Result<Vec<Bar>, TradesimError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TradesimError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| TradesimError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let datetime_str = record.get(0).ok_or_else(|| TradesimError::Database {
                reason: "missing datetime column".into(),
            })?;
            let datetime = parse_datetime(datetime_str)?;

            let open = parse_field(&record, 1, "open")?;
            let high = parse_field(&record, 2, "high")?;
            let low = parse_field(&record, 3, "low")?;
            let close = parse_field(&record, 4, "close")?;
            let volume: i64 = record
                .get(5)
                .ok_or_else(|| TradesimError::Database {
                    reason: "missing volume column".into(),
                })?
                .parse()
                .map_err(|e| TradesimError::Database {
                    reason: format!("invalid volume value: {}", e),
                })?;

            bars.push(Bar::from_datetime(
                symbol.to_string(),
                datetime,
                open,
                high,
                low,
                close,
                volume,
            ));
        }

        bars.sort_by_key(|b| b.datetime);
        Ok(bars)
    }
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, TradesimError> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    Err(TradesimError::Database {
        reason: format!("invalid datetime value: {}", value),
    })
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<f64, TradesimError> {
    record
        .get(index)
        .ok_or_else(|| TradesimError::Database {
            reason: format!("missing {} column", name),
        })?
        .parse()
        .map_err(|e| TradesimError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.datetime >= start && b.datetime <= end)
            .collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TradesimError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TradesimError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn latest_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, TradesimError> {
        let mut bars = self.read_all(symbol)?;
        bars.reverse();
        bars.truncate(limit);
        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        let bars = self.read_all(symbol)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.datetime, last.datetime, bars.len()))),
            _ => Ok(None),
        }
    }
}
