//! Open lot tracking and the executed-trade ledger.
//!
//! A [`Position`] is one discrete buy's shares, held until the whole lot is
//! sold. Lots are atomic: there are no partial sells.

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// Unique within a single run.
    pub id: u64,
    pub buy_price: f64,
    pub shares: f64,
    /// Cash spent to open the lot.
    pub amount: f64,
    pub buy_time: NaiveDateTime,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    /// Profit if the whole lot were sold at `price`.
    pub fn realized_profit(&self, price: f64) -> f64 {
        self.shares * price - self.amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed action, append-only.
///
/// `account_balance` is always `remaining_balance + total_shares * price`
/// at the instant of the trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Monotonic counter starting at 1.
    pub trade_no: u32,
    pub datetime: NaiveDateTime,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub symbol: String,
    pub price: f64,
    pub shares: f64,
    /// Shares held after this trade.
    pub total_shares: f64,
    /// Cash after this trade.
    pub remaining_balance: f64,
    pub account_balance: f64,
    /// Cash amount of the trade.
    pub amount: f64,
    /// 0 for buys, sell proceeds minus cost basis for sells.
    pub profit: f64,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_lot() -> Position {
        Position {
            id: 1,
            buy_price: 97.0,
            shares: 1000.0 / 97.0,
            amount: 1000.0,
            buy_time: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn market_value_scales_with_price() {
        let lot = sample_lot();
        let expected = (1000.0 / 97.0) * 102.0;
        assert!((lot.market_value(102.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn realized_profit_at_higher_price() {
        let lot = sample_lot();
        // 1000/97 shares sold at 102 returns 1051.55, profit ~51.55
        let profit = lot.realized_profit(102.0);
        assert!((profit - (1000.0 / 97.0 * 102.0 - 1000.0)).abs() < 1e-9);
        assert!(profit > 0.0);
    }

    #[test]
    fn realized_profit_at_buy_price_is_zero() {
        let lot = sample_lot();
        assert!(lot.realized_profit(97.0).abs() < 1e-9);
    }

    #[test]
    fn realized_profit_at_lower_price_is_negative() {
        let lot = sample_lot();
        assert!(lot.realized_profit(90.0) < 0.0);
    }

    #[test]
    fn trade_side_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&TradeSide::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&TradeSide::Sell).unwrap(), "\"SELL\"");
    }

    #[test]
    fn trade_record_serializes_camel_case() {
        let record = TradeRecord {
            trade_no: 1,
            datetime: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            side: TradeSide::Buy,
            symbol: "SOFI".into(),
            price: 97.0,
            shares: 10.0,
            total_shares: 10.0,
            remaining_balance: 9030.0,
            account_balance: 10000.0,
            amount: 970.0,
            profit: 0.0,
            comment: "test".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"tradeNo\":1"));
        assert!(json.contains("\"type\":\"BUY\""));
        assert!(json.contains("\"remainingBalance\":9030.0"));
        assert!(json.contains("\"accountBalance\":10000.0"));
    }
}
