//! Portfolio-level accounting.
//!
//! One `PortfolioState` per process, persisted to `bot-state.json`. It is only
//! mutated through a single serialized path in the engine: an entry increments
//! the daily trade counter, a close applies realized P&L.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Per-day counters, reset on calendar-date change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Entries made today; gates the daily trade cap.
    pub trades: u32,
    /// Sum of positive realized P&L today.
    pub profit: f64,
    /// Sum of absolute negative realized P&L today.
    pub loss: f64,
    /// Calendar date these counters belong to (`YYYY-MM-DD`, UTC).
    pub date: String,
}

impl DailyStats {
    pub fn new(date: String) -> Self {
        Self {
            trades: 0,
            profit: 0.0,
            loss: 0.0,
            date,
        }
    }

    /// Reset counters if `today` differs from the stored date. Returns true
    /// when a rollover happened.
    pub fn rollover_if_needed(&mut self, today: &str) -> bool {
        if self.date == today {
            return false;
        }
        *self = Self::new(today.to_string());
        true
    }
}

/// Aggregate portfolio state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioState {
    /// Cumulative realized profit/loss in USDC, updated only on close.
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    /// Current tradable capital estimate in USDC.
    pub portfolio_value: f64,
    /// Daily counters.
    pub daily_stats: DailyStats,
    /// Last persisted heartbeat, epoch milliseconds.
    pub last_heartbeat: Option<i64>,
}

impl PortfolioState {
    /// Fresh state for a given starting capital, dated today.
    pub fn new(starting_capital: f64) -> Self {
        Self {
            total_pnl: 0.0,
            portfolio_value: starting_capital,
            daily_stats: DailyStats::new(today_utc()),
            last_heartbeat: None,
        }
    }

    /// Count an entry against the daily cap.
    pub fn record_entry(&mut self) {
        self.daily_stats.trades += 1;
    }

    /// Apply one close's realized P&L to the aggregate and daily buckets.
    pub fn apply_close(&mut self, pnl_usd: f64) {
        self.total_pnl += pnl_usd;
        self.portfolio_value += pnl_usd;
        if pnl_usd >= 0.0 {
            self.daily_stats.profit += pnl_usd;
        } else {
            self.daily_stats.loss += pnl_usd.abs();
        }
    }

    /// Drawdown relative to starting capital, in percent. Negative when the
    /// portfolio is down.
    pub fn pnl_percent_of(&self, starting_capital: f64) -> f64 {
        if starting_capital <= 0.0 {
            return 0.0;
        }
        self.total_pnl / starting_capital * 100.0
    }
}

/// Current UTC calendar date as `YYYY-MM-DD`.
pub fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
