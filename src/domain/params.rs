//! Fully-resolved backtest parameters.
//!
//! Strategy parameters are a tagged union, one variant per strategy, so the
//! engine loop only ever sees typed values. Defaulting happens here at the
//! boundary, never inside the loop.

use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDateTime;
use serde::Serialize;

pub const GRID_TRADING: &str = "grid_trading";
pub const RSI_MEAN_REVERSION: &str = "rsi_mean_reversion";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridParams {
    pub move_down_percent: f64,
    pub move_up_percent: f64,
    pub amount_to_buy: f64,
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            move_down_percent: 2.0,
            move_up_percent: 5.0,
            amount_to_buy: 1000.0,
        }
    }
}

impl GridParams {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = GridParams::default();
        GridParams {
            move_down_percent: config.get_double(
                "grid",
                "move_down_percent",
                defaults.move_down_percent,
            ),
            move_up_percent: config.get_double(
                "grid",
                "move_up_percent",
                defaults.move_up_percent,
            ),
            amount_to_buy: config.get_double("grid", "amount_to_buy", defaults.amount_to_buy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsiParams {
    pub period: usize,
    pub oversold_threshold: f64,
    pub overbought_threshold: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            period: 14,
            oversold_threshold: 30.0,
            overbought_threshold: 70.0,
        }
    }
}

impl RsiParams {
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let defaults = RsiParams::default();
        RsiParams {
            period: config.get_int("rsi", "period", defaults.period as i64).max(1) as usize,
            oversold_threshold: config.get_double(
                "rsi",
                "oversold_threshold",
                defaults.oversold_threshold,
            ),
            overbought_threshold: config.get_double(
                "rsi",
                "overbought_threshold",
                defaults.overbought_threshold,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum StrategyParams {
    Grid(GridParams),
    RsiMeanReversion(RsiParams),
}

impl StrategyParams {
    /// Resolve a strategy type name plus config-supplied parameters into a
    /// typed variant. Unknown names are rejected here, once, instead of
    /// being string-compared per bar.
    pub fn from_config(
        strategy_type: &str,
        config: &dyn ConfigPort,
    ) -> Result<Self, TradesimError> {
        match strategy_type {
            GRID_TRADING => Ok(StrategyParams::Grid(GridParams::from_config(config))),
            RSI_MEAN_REVERSION => Ok(StrategyParams::RsiMeanReversion(RsiParams::from_config(
                config,
            ))),
            other => Err(TradesimError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StrategyParams::Grid(_) => GRID_TRADING,
            StrategyParams::RsiMeanReversion(_) => RSI_MEAN_REVERSION,
        }
    }
}

/// Everything a single run needs; assumed pre-validated (see
/// [`crate::domain::validation`]).
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestParams {
    pub symbol: String,
    pub initial_balance: f64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub strategy: StrategyParams,
}
