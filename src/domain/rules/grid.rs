//! Grid trading rules.
//!
//! Buys on fixed percentage dips, sells each lot on a fixed percentage
//! rally above its own buy price. Entries are anchored to the 7-day high
//! until the first trade; afterwards to the price of the last executed
//! action (buy or sell).

use super::{BuyOrder, RuleContext, SellPick, TradeRules};
use crate::domain::bar::Bar;
use crate::domain::params::GridParams;
use crate::domain::position::Position;
use chrono::NaiveDate;

pub struct GridTrading {
    params: GridParams,
    has_traded: bool,
    reference_price: f64,
}

impl GridTrading {
    pub fn new(params: GridParams) -> Self {
        GridTrading {
            params,
            has_traded: false,
            reference_price: 0.0,
        }
    }

    /// Price at or below which a dip from `base` triggers a buy.
    fn entry_threshold(&self, base: f64) -> f64 {
        base * (1.0 - self.params.move_down_percent / 100.0)
    }
}

impl TradeRules for GridTrading {
    fn sell_picks(&self, bar: &Bar, _index: usize, positions: &[Position]) -> Vec<SellPick> {
        let target_multiplier = 1.0 + self.params.move_up_percent / 100.0;
        positions
            .iter()
            .filter(|lot| bar.close >= lot.buy_price * target_multiplier)
            .map(|lot| SellPick {
                position_id: lot.id,
                comment: format!("Sold lot bought at {:.2}", lot.buy_price),
            })
            .collect()
    }

    fn buy_signal(&self, bar: &Bar, _index: usize, ctx: &RuleContext) -> Option<BuyOrder> {
        let price = bar.close;

        if !self.has_traded {
            let high = ctx.seven_day_high;
            if high > 0.0 && price <= self.entry_threshold(high) {
                return Some(BuyOrder {
                    amount: self.params.amount_to_buy,
                    reason: format!(
                        "Initial entry: drop of {}% from 7-day high ({:.2})",
                        self.params.move_down_percent, high
                    ),
                });
            }
            return None;
        }

        if price <= self.entry_threshold(self.reference_price) {
            return Some(BuyOrder {
                amount: self.params.amount_to_buy,
                reason: format!(
                    "Drop of {}% from last action ({:.2})",
                    self.params.move_down_percent, self.reference_price
                ),
            });
        }

        if ctx.open_lots == 0 {
            let high = ctx.seven_day_high;
            if high > 0.0 && price <= self.entry_threshold(high) {
                return Some(BuyOrder {
                    amount: self.params.amount_to_buy,
                    reason: format!(
                        "Re-entry: drop of {}% from 7-day high ({:.2})",
                        self.params.move_down_percent, high
                    ),
                });
            }
        }

        None
    }

    fn on_buy(&mut self, price: f64, _date: NaiveDate) {
        self.reference_price = price;
        self.has_traded = true;
    }

    fn on_sell(&mut self, price: f64, _date: NaiveDate) {
        self.reference_price = price;
        self.has_traded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(close: f64) -> Bar {
        Bar::from_datetime(
            "SOFI".into(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1000,
        )
    }

    fn lot(id: u64, buy_price: f64) -> Position {
        Position {
            id,
            buy_price,
            shares: 1000.0 / buy_price,
            amount: 1000.0,
            buy_time: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
        }
    }

    fn ctx(seven_day_high: f64, open_lots: usize) -> RuleContext {
        RuleContext {
            cash: 10_000.0,
            initial_balance: 10_000.0,
            open_lots,
            seven_day_high,
        }
    }

    #[test]
    fn sells_every_lot_at_or_above_target() {
        let rules = GridTrading::new(GridParams::default());
        // Targets with 5% up: 100 -> 105, 97 -> 101.85, 103 -> 108.15
        let positions = vec![lot(1, 100.0), lot(2, 97.0), lot(3, 103.0)];
        let picks = rules.sell_picks(&bar(105.0), 0, &positions);
        let ids: Vec<u64> = picks.iter().map(|p| p.position_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(picks[0].comment, "Sold lot bought at 100.00");
    }

    #[test]
    fn no_sell_below_target() {
        let rules = GridTrading::new(GridParams::default());
        let positions = vec![lot(1, 100.0)];
        assert!(rules.sell_picks(&bar(104.9), 0, &positions).is_empty());
    }

    #[test]
    fn initial_entry_requires_valid_seven_day_high() {
        let rules = GridTrading::new(GridParams::default());
        // No history at all: high of 0 means no baseline to dip from.
        assert!(rules.buy_signal(&bar(50.0), 0, &ctx(0.0, 0)).is_none());
    }

    #[test]
    fn initial_entry_on_dip_from_high() {
        let rules = GridTrading::new(GridParams::default());
        // 2% below 100 is 98.
        let order = rules.buy_signal(&bar(98.0), 0, &ctx(100.0, 0)).unwrap();
        assert_eq!(order.amount, 1000.0);
        assert_eq!(order.reason, "Initial entry: drop of 2% from 7-day high (100.00)");
        assert!(rules.buy_signal(&bar(98.1), 0, &ctx(100.0, 0)).is_none());
    }

    #[test]
    fn subsequent_buys_anchor_to_last_action() {
        let mut rules = GridTrading::new(GridParams::default());
        rules.on_buy(98.0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        // 2% below 98 is 96.04.
        let order = rules.buy_signal(&bar(96.0), 1, &ctx(100.0, 1)).unwrap();
        assert_eq!(order.reason, "Drop of 2% from last action (98.00)");
        assert!(rules.buy_signal(&bar(96.1), 1, &ctx(100.0, 1)).is_none());
    }

    #[test]
    fn sell_rearms_the_dip_anchor() {
        let mut rules = GridTrading::new(GridParams::default());
        rules.on_buy(98.0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        rules.on_sell(103.0, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        // Anchor moved to 103; 2% below is 100.94, so 100.9 buys again.
        let order = rules.buy_signal(&bar(100.9), 2, &ctx(103.0, 1)).unwrap();
        assert_eq!(order.reason, "Drop of 2% from last action (103.00)");
    }

    #[test]
    fn reentry_from_high_only_when_flat() {
        let mut rules = GridTrading::new(GridParams::default());
        rules.on_sell(120.0, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        // 110 is well above the 120-anchor threshold (117.6) but is a 2%+
        // dip from the 7-day high of 113. Only valid with zero open lots.
        assert!(rules.buy_signal(&bar(110.0), 3, &ctx(113.0, 1)).is_none());
        let order = rules.buy_signal(&bar(110.0), 3, &ctx(113.0, 0)).unwrap();
        assert_eq!(order.reason, "Re-entry: drop of 2% from 7-day high (113.00)");
    }

    #[test]
    fn custom_percentages_respected() {
        let rules = GridTrading::new(GridParams {
            move_down_percent: 10.0,
            move_up_percent: 20.0,
            amount_to_buy: 500.0,
        });
        assert!(rules.buy_signal(&bar(91.0), 0, &ctx(100.0, 0)).is_none());
        let order = rules.buy_signal(&bar(90.0), 0, &ctx(100.0, 0)).unwrap();
        assert_eq!(order.amount, 500.0);

        let positions = vec![lot(1, 100.0)];
        assert!(rules.sell_picks(&bar(119.0), 0, &positions).is_empty());
        assert_eq!(rules.sell_picks(&bar(120.0), 0, &positions).len(), 1);
    }
}
