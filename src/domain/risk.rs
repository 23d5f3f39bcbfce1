//! Risk policy.
//!
//! Stateless decision functions over the portfolio state and configured
//! limits. The portfolio stop is fatal for new trading but never liquidates
//! existing positions; that is evaluated and latched by the engine.

use serde::{Deserialize, Serialize};

use super::portfolio::PortfolioState;

/// Configured risk ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Capital at process start, the base for the portfolio stop.
    pub starting_capital: f64,
    /// Maximum concurrent open positions.
    pub max_positions: usize,
    /// Maximum entries per calendar day.
    pub max_daily_trades: u32,
    /// Portfolio drawdown percent that halts new trading.
    pub portfolio_stop_loss_pct: f64,
}

impl RiskLimits {
    /// Whether a new entry is allowed right now.
    ///
    /// False when the open-position count is at the cap, the daily trade cap
    /// is reached, or the portfolio stop condition holds.
    pub fn can_enter_new_position(&self, open_positions: usize, state: &PortfolioState) -> bool {
        if open_positions >= self.max_positions {
            return false;
        }
        if state.daily_stats.trades >= self.max_daily_trades {
            return false;
        }
        !self.portfolio_stop_triggered(state)
    }

    /// The fatal portfolio stop: cumulative realized drawdown at or beyond
    /// the configured percentage of starting capital.
    pub fn portfolio_stop_triggered(&self, state: &PortfolioState) -> bool {
        state.pnl_percent_of(self.starting_capital) <= -self.portfolio_stop_loss_pct
    }
}
