//! Backtest simulation engine.
//!
//! One forward pass over time-ordered bars. Per bar, in order: day-high
//! rollover, pre-trade equity (sampled into the equity curve and fed to the
//! drawdown tracker), sells, then buys. Sells run first so their proceeds
//! are available to a buy on the same bar. Share and cost totals are
//! maintained incrementally rather than recomputed from the open lots.
//!
//! A run is a pure function of its inputs: no state survives between runs,
//! and identical inputs produce identical output.

use crate::domain::bar::Bar;
use crate::domain::day_high::DayHighTracker;
use crate::domain::error::TradesimError;
use crate::domain::metrics::{DrawdownTracker, EquitySample, Summary};
use crate::domain::params::BacktestParams;
use crate::domain::position::{Position, TradeRecord, TradeSide};
use crate::domain::rules::{build_rules, RuleContext};
use crate::ports::data_port::DataPort;
use serde::Serialize;

/// Upper bound on equity curve length; the sample rate is derived from it.
pub const EQUITY_SAMPLE_TARGET: usize = 1000;

/// Grid entries anchor to the high of this many prior calendar days.
const HIGH_LOOKBACK_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub trades: Vec<TradeRecord>,
    pub equity_history: Vec<EquitySample>,
    pub summary: Summary,
}

/// Fetch bars for the configured symbol and window and replay the strategy
/// over them.
///
/// Data-source errors abort the run and surface unmodified; an empty bar
/// set is not an error and yields a zero-trade result whose summary mirrors
/// the initial balance.
pub fn run_backtest(
    data: &dyn DataPort,
    params: &BacktestParams,
) -> Result<BacktestResult, TradesimError> {
    let bars = data.fetch_bars(&params.symbol, params.start, params.end)?;
    Ok(replay(&bars, params))
}

/// The bar loop, split from the fetch so tests can drive it directly.
pub fn replay(bars: &[Bar], params: &BacktestParams) -> BacktestResult {
    if bars.is_empty() {
        return empty_result(params);
    }

    let mut rules = build_rules(&params.strategy);
    rules.prepare(bars);

    let mut cash = params.initial_balance;
    let mut open_positions: Vec<Position> = Vec::new();
    let mut total_shares_held = 0.0_f64;
    let mut total_invested_unsold = 0.0_f64;
    let mut total_profit = 0.0_f64;
    let mut position_id_counter = 1_u64;
    let mut trade_no_counter = 1_u32;

    let mut day_highs = DayHighTracker::new();
    let mut drawdown = DrawdownTracker::new(params.initial_balance);
    let mut trades: Vec<TradeRecord> = Vec::new();
    let mut equity_history: Vec<EquitySample> = Vec::new();
    let sample_rate = (bars.len() / EQUITY_SAMPLE_TARGET).max(1);

    for (index, bar) in bars.iter().enumerate() {
        day_highs.observe(bar.date, bar.high);

        let equity = cash + total_shares_held * bar.close;
        if index % sample_rate == 0 || index == bars.len() - 1 {
            equity_history.push(EquitySample {
                datetime: bar.datetime,
                account_balance: equity,
            });
        }
        drawdown.observe(equity, bar.datetime);

        for pick in rules.sell_picks(bar, index, &open_positions) {
            let Some(slot) = open_positions
                .iter()
                .position(|lot| lot.id == pick.position_id)
            else {
                continue;
            };
            let lot = open_positions.remove(slot);

            let sell_amount = lot.market_value(bar.close);
            let profit = lot.realized_profit(bar.close);
            cash += sell_amount;
            total_profit += profit;
            total_shares_held -= lot.shares;
            total_invested_unsold -= lot.amount;
            rules.on_sell(bar.close, bar.date);

            trades.push(TradeRecord {
                trade_no: next_trade_no(&mut trade_no_counter),
                datetime: bar.datetime,
                side: TradeSide::Sell,
                symbol: params.symbol.clone(),
                price: bar.close,
                shares: lot.shares,
                total_shares: total_shares_held,
                remaining_balance: cash,
                account_balance: cash + total_shares_held * bar.close,
                amount: sell_amount,
                profit,
                comment: pick.comment,
            });
        }

        let ctx = RuleContext {
            cash,
            initial_balance: params.initial_balance,
            open_lots: open_positions.len(),
            seven_day_high: day_highs.lookback_high(HIGH_LOOKBACK_DAYS),
        };
        if let Some(order) = rules.buy_signal(bar, index, &ctx) {
            // Insufficient cash skips the buy outright; nothing is deferred
            // and the rules' state does not advance.
            if cash >= order.amount {
                let shares = order.amount / bar.close;
                cash -= order.amount;
                total_shares_held += shares;
                total_invested_unsold += order.amount;
                open_positions.push(Position {
                    id: next_position_id(&mut position_id_counter),
                    buy_price: bar.close,
                    shares,
                    amount: order.amount,
                    buy_time: bar.datetime,
                });
                rules.on_buy(bar.close, bar.date);

                trades.push(TradeRecord {
                    trade_no: next_trade_no(&mut trade_no_counter),
                    datetime: bar.datetime,
                    side: TradeSide::Buy,
                    symbol: params.symbol.clone(),
                    price: bar.close,
                    shares,
                    total_shares: total_shares_held,
                    remaining_balance: cash,
                    account_balance: cash + total_shares_held * bar.close,
                    amount: order.amount,
                    profit: 0.0,
                    comment: order.reason,
                });
            }
        }
    }

    let last_close = bars[bars.len() - 1].close;
    let final_account_value = cash + total_shares_held * last_close;

    let summary = Summary {
        symbol: params.symbol.clone(),
        total_profit_realized: total_profit,
        current_cash_balance: cash,
        unsold_shares: total_shares_held,
        average_price_unsold: if total_shares_held > 0.0 {
            total_invested_unsold / total_shares_held
        } else {
            0.0
        },
        final_account_value,
        max_drawdown_percent: drawdown.max_drawdown_percent(),
        max_drawdown_amount: drawdown.max_drawdown_amount,
        min_equity: drawdown.min_equity,
        min_equity_time: drawdown.min_equity_time,
        peak_value: drawdown.peak_value,
        initial_balance: params.initial_balance,
    };

    BacktestResult {
        trades,
        equity_history,
        summary,
    }
}

fn empty_result(params: &BacktestParams) -> BacktestResult {
    BacktestResult {
        trades: Vec::new(),
        equity_history: Vec::new(),
        summary: Summary {
            symbol: params.symbol.clone(),
            total_profit_realized: 0.0,
            current_cash_balance: params.initial_balance,
            unsold_shares: 0.0,
            average_price_unsold: 0.0,
            final_account_value: params.initial_balance,
            max_drawdown_percent: 0.0,
            max_drawdown_amount: 0.0,
            min_equity: params.initial_balance,
            min_equity_time: None,
            peak_value: params.initial_balance,
            initial_balance: params.initial_balance,
        },
    }
}

fn next_trade_no(counter: &mut u32) -> u32 {
    let n = *counter;
    *counter += 1;
    n
}

fn next_position_id(counter: &mut u64) -> u64 {
    let n = *counter;
    *counter += 1;
    n
}
