#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use tradesim::domain::bar::Bar;
use tradesim::domain::error::TradesimError;
use tradesim::domain::params::{BacktestParams, GridParams, RsiParams, StrategyParams};
use tradesim::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.datetime >= start && b.datetime <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn latest_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, TradesimError> {
        let mut bars = self.data.get(symbol).cloned().unwrap_or_default();
        bars.reverse();
        bars.truncate(limit);
        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradesimError::Database {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.datetime).min().unwrap();
                let max = bars.iter().map(|b| b.datetime).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn dt(y: i32, m: u32, d: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// A bar whose high equals its close; good enough for most scenarios.
pub fn make_bar(symbol: &str, datetime: NaiveDateTime, close: f64) -> Bar {
    Bar::from_datetime(
        symbol.to_string(),
        datetime,
        close,
        close,
        close - 1.0,
        close,
        1000,
    )
}

/// A bar with an explicit intraday high.
pub fn make_bar_with_high(symbol: &str, datetime: NaiveDateTime, close: f64, high: f64) -> Bar {
    Bar::from_datetime(
        symbol.to_string(),
        datetime,
        close,
        high,
        close - 1.0,
        close,
        1000,
    )
}

/// One bar per day at 16:00 starting 2024-01-01.
pub fn daily_bars(symbol: &str, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            make_bar(
                symbol,
                dt(2024, 1, 1, 16) + chrono::Duration::days(i as i64),
                close,
            )
        })
        .collect()
}

pub fn grid_params(symbol: &str, initial_balance: f64) -> BacktestParams {
    BacktestParams {
        symbol: symbol.to_string(),
        initial_balance,
        start: dt(2024, 1, 1, 0),
        end: dt(2024, 12, 31, 23),
        strategy: StrategyParams::Grid(GridParams::default()),
    }
}

pub fn rsi_params(symbol: &str, initial_balance: f64, period: usize) -> BacktestParams {
    BacktestParams {
        symbol: symbol.to_string(),
        initial_balance,
        start: dt(2024, 1, 1, 0),
        end: dt(2024, 12, 31, 23),
        strategy: StrategyParams::RsiMeanReversion(RsiParams {
            period,
            ..RsiParams::default()
        }),
    }
}
