//! RSI mean-reversion rules.
//!
//! Buys a fixed fraction of the initial balance when RSI drops to the
//! oversold threshold, at most once per calendar day and at most
//! [`MAX_OPEN_LOTS`] lots at a time. Exits the entire book when RSI reaches
//! the overbought threshold. Warm-up bars (undefined RSI) never signal.
//!
//! The per-day throttle advances only on executed buys. A full exit
//! therefore does not block a re-entry later the same day.

use super::{BuyOrder, RuleContext, SellPick, TradeRules};
use crate::domain::bar::Bar;
use crate::domain::indicator::compute_rsi;
use crate::domain::params::RsiParams;
use crate::domain::position::Position;
use chrono::NaiveDate;

pub const MAX_OPEN_LOTS: usize = 5;

/// Fraction of the initial balance spent per entry.
const BUY_FRACTION: f64 = 0.10;

pub struct RsiMeanReversion {
    params: RsiParams,
    series: Vec<Option<f64>>,
    last_buy_day: Option<NaiveDate>,
}

impl RsiMeanReversion {
    pub fn new(params: RsiParams) -> Self {
        RsiMeanReversion {
            params,
            series: Vec::new(),
            last_buy_day: None,
        }
    }

    fn rsi_at(&self, index: usize) -> Option<f64> {
        self.series.get(index).copied().flatten()
    }
}

impl TradeRules for RsiMeanReversion {
    fn prepare(&mut self, bars: &[Bar]) {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        self.series = compute_rsi(&closes, self.params.period);
    }

    fn sell_picks(&self, _bar: &Bar, index: usize, positions: &[Position]) -> Vec<SellPick> {
        let Some(rsi) = self.rsi_at(index) else {
            return Vec::new();
        };
        if rsi < self.params.overbought_threshold {
            return Vec::new();
        }
        // Full-book exit, not per-lot target pricing.
        positions
            .iter()
            .map(|lot| SellPick {
                position_id: lot.id,
                comment: format!(
                    "RSI {:.2} reached overbought threshold {}, exiting all lots",
                    rsi, self.params.overbought_threshold
                ),
            })
            .collect()
    }

    fn buy_signal(&self, bar: &Bar, index: usize, ctx: &RuleContext) -> Option<BuyOrder> {
        let rsi = self.rsi_at(index)?;
        if rsi > self.params.oversold_threshold {
            return None;
        }
        let amount = BUY_FRACTION * ctx.initial_balance;
        if ctx.cash < amount {
            return None;
        }
        if self.last_buy_day == Some(bar.date) {
            return None;
        }
        if ctx.open_lots >= MAX_OPEN_LOTS {
            return None;
        }
        Some(BuyOrder {
            amount,
            reason: format!(
                "RSI {:.2} at or below oversold threshold {}",
                rsi, self.params.oversold_threshold
            ),
        })
    }

    fn on_buy(&mut self, _price: f64, date: NaiveDate) {
        self.last_buy_day = Some(date);
    }
}
