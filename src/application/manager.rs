//! Position Manager
//!
//! Owns the open-position set and the bookkeeping side of entry and close.
//! The engine wraps these calls with persistence, swap execution, and alerts
//! so that all state mutation stays on one serialized path.

use chrono::Utc;

use crate::config::TradingSection;
use crate::domain::{CloseReason, ClosedTrade, PortfolioState, Position, PositionError};

use super::scanner::Opportunity;

/// Capital committed to a new entry: `min(max_position_size, 10% of the
/// current portfolio value)`.
pub fn position_size(state: &PortfolioState, config: &TradingSection) -> f64 {
    config.max_position_size.min(state.portfolio_value * 0.1)
}

#[derive(Debug, Default)]
pub struct PositionManager {
    open: Vec<Position>,
    last_id: u64,
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted open set; id allocation resumes past the
    /// highest recovered id.
    pub fn from_loaded(open: Vec<Position>) -> Self {
        let last_id = open.iter().map(|p| p.id).max().unwrap_or(0);
        Self { open, last_id }
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Whether a token already has an open position.
    pub fn holds(&self, token: &str) -> bool {
        self.open.iter().any(|p| p.token == token)
    }

    /// Next position id: creation time in epoch ms, bumped past the previous
    /// id so rapid entries stay collision-free.
    fn next_id(&mut self) -> u64 {
        let now = Utc::now().timestamp_millis() as u64;
        self.last_id = now.max(self.last_id + 1);
        self.last_id
    }

    /// Open a position for an opportunity.
    ///
    /// Sizing is `min(max_position_size, portfolio_value * 0.1)`. Returns
    /// `None` without touching any counter when the token is already held —
    /// at most one open position per token. Increments the daily trade
    /// counter on success.
    pub fn enter(
        &mut self,
        opportunity: &Opportunity,
        state: &mut PortfolioState,
        config: &TradingSection,
    ) -> Result<Option<Position>, PositionError> {
        if self.holds(&opportunity.token) {
            tracing::debug!("Already holding {}, skipping entry", opportunity.symbol);
            return Ok(None);
        }

        let size = position_size(state, config);
        let id = self.next_id();
        let position = Position::open(
            id,
            opportunity.token.clone(),
            opportunity.symbol.clone(),
            opportunity.price,
            size,
            config.stop_loss_pct,
            config.take_profit_pct,
            Utc::now(),
        )?;

        tracing::info!(
            "Opened {} ${:.2} @ ${:.6} (stop {:.6}, take {:.6})",
            position.symbol,
            position.size,
            position.entry_price,
            position.stop_loss,
            position.take_profit
        );

        state.record_entry();
        self.open.push(position.clone());
        Ok(Some(position))
    }

    /// Close a position at an exit price, applying realized P&L to the
    /// portfolio. Returns `None` when the id is not in the open set, which
    /// makes double closes harmless.
    pub fn close(
        &mut self,
        id: u64,
        exit_price: f64,
        reason: CloseReason,
        state: &mut PortfolioState,
    ) -> Option<ClosedTrade> {
        let index = self.open.iter().position(|p| p.id == id)?;
        let position = self.open.remove(index);
        let trade = position.into_closed(exit_price, Utc::now(), reason);

        state.apply_close(trade.pnl_usd);

        tracing::info!(
            "Closed {} [{}] @ ${:.6}: {:+.2}% (${:+.2})",
            trade.symbol,
            trade.reason,
            trade.exit_price,
            trade.pnl_percent,
            trade.pnl_usd
        );

        Some(trade)
    }
}
