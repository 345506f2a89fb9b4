//! Aggregate statistics over a set of backtest trades.

use super::replay::BacktestTrade;
use super::risk::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_r_multiple: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub long_trades: usize,
    pub long_win_rate: f64,
    pub short_trades: usize,
    pub short_win_rate: f64,
}

impl BacktestSummary {
    /// Compute summary statistics in trade order. PnL here is per-unit
    /// price movement; sizing is out of scope.
    pub fn compute(trades: &[BacktestTrade]) -> Self {
        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_pnl = 0.0_f64;
        let mut total_r = 0.0_f64;
        let mut long_trades = 0usize;
        let mut long_wins = 0usize;
        let mut short_trades = 0usize;
        let mut short_wins = 0usize;

        for trade in trades {
            let pnl = trade.pnl;
            total_pnl += pnl;
            total_r += trade.r_multiple;

            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            } else {
                trades_breakeven += 1;
            }

            match trade.signal.direction {
                Direction::Long => {
                    long_trades += 1;
                    if pnl > 0.0 {
                        long_wins += 1;
                    }
                }
                Direction::Short => {
                    short_trades += 1;
                    if pnl > 0.0 {
                        short_wins += 1;
                    }
                }
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_pnl = if total_trades > 0 {
            total_pnl / total_trades as f64
        } else {
            0.0
        };

        let avg_r_multiple = if total_trades > 0 {
            total_r / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let long_win_rate = if long_trades > 0 {
            long_wins as f64 / long_trades as f64
        } else {
            0.0
        };

        let short_win_rate = if short_trades > 0 {
            short_wins as f64 / short_trades as f64
        } else {
            0.0
        };

        let max_drawdown = compute_drawdown(trades);

        BacktestSummary {
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            total_pnl,
            avg_pnl,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_r_multiple,
            profit_factor,
            max_drawdown,
            long_trades,
            long_win_rate,
            short_trades,
            short_win_rate,
        }
    }
}

/// Largest peak-to-trough fall of the cumulative PnL curve, in price
/// units. Trades are taken in the order given.
fn compute_drawdown(trades: &[BacktestTrade]) -> f64 {
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        equity += trade.pnl;
        if equity > peak {
            peak = equity;
        } else if peak - equity > max_dd {
            max_dd = peak - equity;
        }
    }

    max_dd
}
