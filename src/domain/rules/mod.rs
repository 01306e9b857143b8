//! Per-bar strategy decision logic.
//!
//! The engine asks the active rule set which lots to sell and whether to buy
//! on every bar, sells first. Rules carry their own trade-dependent state
//! (reference prices, per-day throttles); the engine reports executed trades
//! back through `on_buy`/`on_sell` so that state only advances for trades
//! that actually happened (a buy skipped for lack of cash changes nothing).

pub mod grid;
pub mod rsi_reversion;

pub use grid::GridTrading;
pub use rsi_reversion::RsiMeanReversion;

use crate::domain::bar::Bar;
use crate::domain::params::StrategyParams;
use crate::domain::position::Position;
use chrono::NaiveDate;

/// Engine state snapshot handed to the buy rule, taken after the bar's
/// sells have settled.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub cash: f64,
    pub initial_balance: f64,
    pub open_lots: usize,
    /// Max high over the still-open day and the prior 7 calendar days;
    /// 0 when no bar has been seen (treated as "no valid high").
    pub seven_day_high: f64,
}

/// A lot the rules want closed at the current bar's close.
#[derive(Debug, Clone, PartialEq)]
pub struct SellPick {
    pub position_id: u64,
    pub comment: String,
}

/// A buy the rules want executed at the current bar's close. The engine
/// still applies the cash check and skips silently when it fails.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyOrder {
    pub amount: f64,
    pub reason: String,
}

pub trait TradeRules {
    /// Called once before the bar loop with the full bar sequence.
    fn prepare(&mut self, _bars: &[Bar]) {}

    /// Which open lots to close at this bar. All returned picks are
    /// executed, in the order given, before the buy rule runs.
    fn sell_picks(&self, bar: &Bar, index: usize, positions: &[Position]) -> Vec<SellPick>;

    fn buy_signal(&self, bar: &Bar, index: usize, ctx: &RuleContext) -> Option<BuyOrder>;

    /// An executed buy at `price` on `date`.
    fn on_buy(&mut self, _price: f64, _date: NaiveDate) {}

    /// An executed sell at `price` on `date`.
    fn on_sell(&mut self, _price: f64, _date: NaiveDate) {}
}

/// Instantiate the rule set for a run. Selected once up front; the engine
/// loop goes through the trait object from then on.
pub fn build_rules(params: &StrategyParams) -> Box<dyn TradeRules> {
    match params {
        StrategyParams::Grid(p) => Box::new(GridTrading::new(*p)),
        StrategyParams::RsiMeanReversion(p) => Box::new(RsiMeanReversion::new(*p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::params::{GridParams, RsiParams};

    #[test]
    fn factory_builds_grid_rules() {
        let params = StrategyParams::Grid(GridParams::default());
        // Smoke test: the boxed rules answer without panicking on no state.
        let rules = build_rules(&params);
        let bar = crate::domain::bar::Bar::from_datetime(
            "SOFI".into(),
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            100.0,
            101.0,
            99.0,
            100.0,
            1000,
        );
        assert!(rules.sell_picks(&bar, 0, &[]).is_empty());
    }

    #[test]
    fn factory_builds_rsi_rules() {
        let params = StrategyParams::RsiMeanReversion(RsiParams::default());
        let mut rules = build_rules(&params);
        rules.prepare(&[]);
    }
}
