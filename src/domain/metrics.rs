//! Running performance metrics and the end-of-run summary.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One point on the (sampled) equity curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquitySample {
    pub datetime: NaiveDateTime,
    pub account_balance: f64,
}

/// Per-run statistics, computed once after the bar loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub symbol: String,
    pub total_profit_realized: f64,
    pub current_cash_balance: f64,
    pub unsold_shares: f64,
    /// Cost basis per unsold share; 0 when nothing is held.
    pub average_price_unsold: f64,
    pub final_account_value: f64,
    /// Percentage, e.g. 12.5 for a 12.5% drawdown.
    pub max_drawdown_percent: f64,
    pub max_drawdown_amount: f64,
    pub min_equity: f64,
    /// None when equity never fell below the initial balance.
    pub min_equity_time: Option<NaiveDateTime>,
    pub peak_value: f64,
    pub initial_balance: f64,
}

/// Bar-by-bar drawdown state.
///
/// `peak_value` is non-decreasing and `min_equity` non-increasing. The
/// amount and percent maxima are tracked independently: when the peak grows
/// between dips, the largest absolute drop and the largest relative drop can
/// occur at different bars.
#[derive(Debug, Clone)]
pub struct DrawdownTracker {
    pub peak_value: f64,
    pub min_equity: f64,
    pub min_equity_time: Option<NaiveDateTime>,
    pub max_drawdown_amount: f64,
    max_drawdown_fraction: f64,
}

impl DrawdownTracker {
    pub fn new(initial_balance: f64) -> Self {
        DrawdownTracker {
            peak_value: initial_balance,
            min_equity: initial_balance,
            min_equity_time: None,
            max_drawdown_amount: 0.0,
            max_drawdown_fraction: 0.0,
        }
    }

    pub fn observe(&mut self, equity: f64, at: NaiveDateTime) {
        if equity > self.peak_value {
            self.peak_value = equity;
        }
        if equity < self.min_equity {
            self.min_equity = equity;
            self.min_equity_time = Some(at);
        }

        let drawdown_amount = self.peak_value - equity;
        let drawdown_fraction = if self.peak_value > 0.0 {
            drawdown_amount / self.peak_value
        } else {
            0.0
        };

        if drawdown_amount > self.max_drawdown_amount {
            self.max_drawdown_amount = drawdown_amount;
        }
        if drawdown_fraction > self.max_drawdown_fraction {
            self.max_drawdown_fraction = drawdown_fraction;
        }
    }

    pub fn max_drawdown_percent(&self) -> f64 {
        self.max_drawdown_fraction * 100.0
    }
}
