//! Open positions and closed trade records.
//!
//! A `Position` is created with stop-loss and take-profit thresholds derived
//! from the entry price and is never mutated afterwards; closing removes it
//! from the open set and produces an immutable `ClosedTrade`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Invalid entry price: {0}")]
    InvalidEntryPrice(f64),
    #[error("Invalid position size: {0}")]
    InvalidSize(f64),
    #[error("Invalid threshold percent: {0}")]
    InvalidThreshold(f64),
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "STOP_LOSS")]
    StopLoss,
    #[serde(rename = "TAKE_PROFIT")]
    TakeProfit,
    #[serde(rename = "MANUAL")]
    Manual,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "STOP_LOSS"),
            CloseReason::TakeProfit => write!(f, "TAKE_PROFIT"),
            CloseReason::Manual => write!(f, "MANUAL"),
        }
    }
}

/// An open trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique, monotonically increasing id (creation time in epoch ms).
    pub id: u64,
    /// Token mint address.
    pub token: String,
    /// Token symbol for display.
    pub symbol: String,
    /// Entry price in USDC.
    pub entry_price: f64,
    /// Capital committed in USDC.
    pub size: f64,
    /// Entry timestamp.
    pub entry_time: DateTime<Utc>,
    /// Absolute stop-loss price, `entry_price * (1 - pct/100)`.
    pub stop_loss: f64,
    /// Absolute take-profit price, `entry_price * (1 + pct/100)`.
    pub take_profit: f64,
}

impl Position {
    /// Open a position, deriving the exit thresholds from the entry price.
    ///
    /// Guarantees `stop_loss < entry_price < take_profit`.
    pub fn open(
        id: u64,
        token: String,
        symbol: String,
        entry_price: f64,
        size: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
        entry_time: DateTime<Utc>,
    ) -> Result<Self, PositionError> {
        if entry_price <= 0.0 {
            return Err(PositionError::InvalidEntryPrice(entry_price));
        }
        if size <= 0.0 {
            return Err(PositionError::InvalidSize(size));
        }
        if stop_loss_pct <= 0.0 || stop_loss_pct >= 100.0 {
            return Err(PositionError::InvalidThreshold(stop_loss_pct));
        }
        if take_profit_pct <= 0.0 {
            return Err(PositionError::InvalidThreshold(take_profit_pct));
        }

        Ok(Self {
            id,
            token,
            symbol,
            entry_price,
            size,
            entry_time,
            stop_loss: entry_price * (1.0 - stop_loss_pct / 100.0),
            take_profit: entry_price * (1.0 + take_profit_pct / 100.0),
        })
    }

    /// Exit decision for a price tick. Stop-loss is evaluated first so that a
    /// misconfigured threshold pair still fails safe.
    pub fn exit_reason(&self, price: f64) -> Option<CloseReason> {
        if price <= self.stop_loss {
            Some(CloseReason::StopLoss)
        } else if price >= self.take_profit {
            Some(CloseReason::TakeProfit)
        } else {
            None
        }
    }

    /// Realized P&L percent at an exit price.
    pub fn pnl_percent(&self, exit_price: f64) -> f64 {
        (exit_price - self.entry_price) / self.entry_price * 100.0
    }

    /// Realized P&L in USDC at an exit price.
    pub fn pnl_usd(&self, exit_price: f64) -> f64 {
        self.pnl_percent(exit_price) / 100.0 * self.size
    }

    /// Produce the immutable trade record for this position.
    pub fn into_closed(
        self,
        exit_price: f64,
        exit_time: DateTime<Utc>,
        reason: CloseReason,
    ) -> ClosedTrade {
        let pnl_percent = self.pnl_percent(exit_price);
        let pnl_usd = self.pnl_usd(exit_price);
        ClosedTrade {
            id: self.id,
            token: self.token,
            symbol: self.symbol,
            entry_price: self.entry_price,
            size: self.size,
            entry_time: self.entry_time,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            exit_price,
            exit_time,
            pnl_percent,
            pnl_usd,
            reason,
        }
    }
}

/// A completed trade, appended to the trade log on close.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    pub id: u64,
    pub token: String,
    pub symbol: String,
    pub entry_price: f64,
    pub size: f64,
    pub entry_time: DateTime<Utc>,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub pnl_percent: f64,
    pub pnl_usd: f64,
    pub reason: CloseReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn open_test_position(entry_price: f64, size: f64) -> Position {
        Position::open(
            1,
            "TokenMint111111111111111111111111111111111".to_string(),
            "TEST".to_string(),
            entry_price,
            size,
            15.0,
            30.0,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_threshold_derivation() {
        let pos = open_test_position(1.0, 50.0);
        assert_relative_eq!(pos.stop_loss, 0.85, epsilon = 1e-9);
        assert_relative_eq!(pos.take_profit, 1.30, epsilon = 1e-9);
        assert!(pos.stop_loss < pos.entry_price && pos.entry_price < pos.take_profit);
    }

    #[test]
    fn test_rejects_invalid_entry() {
        let result = Position::open(
            1,
            "mint".to_string(),
            "TEST".to_string(),
            0.0,
            50.0,
            15.0,
            30.0,
            Utc::now(),
        );
        assert!(matches!(result, Err(PositionError::InvalidEntryPrice(_))));
    }

    #[test]
    fn test_rejects_invalid_size() {
        let result = Position::open(
            1,
            "mint".to_string(),
            "TEST".to_string(),
            1.0,
            -1.0,
            15.0,
            30.0,
            Utc::now(),
        );
        assert!(matches!(result, Err(PositionError::InvalidSize(_))));
    }

    #[test]
    fn test_rejects_stop_loss_over_100_pct() {
        let result = Position::open(
            1,
            "mint".to_string(),
            "TEST".to_string(),
            1.0,
            50.0,
            100.0,
            30.0,
            Utc::now(),
        );
        assert!(matches!(result, Err(PositionError::InvalidThreshold(_))));
    }

    #[test]
    fn test_exit_reason_stop_loss() {
        let pos = open_test_position(1.0, 50.0);
        assert_eq!(pos.exit_reason(0.84), Some(CloseReason::StopLoss));
        assert_eq!(pos.exit_reason(0.85), Some(CloseReason::StopLoss));
        assert_eq!(pos.exit_reason(0.86), None);
    }

    #[test]
    fn test_exit_reason_take_profit() {
        let pos = open_test_position(1.0, 50.0);
        assert_eq!(pos.exit_reason(1.30), Some(CloseReason::TakeProfit));
        assert_eq!(pos.exit_reason(1.50), Some(CloseReason::TakeProfit));
        assert_eq!(pos.exit_reason(1.29), None);
    }

    #[test]
    fn test_stop_loss_wins_on_overlapping_thresholds() {
        // Thresholds cannot overlap through the constructor; force them to
        // verify the fail-safe ordering anyway.
        let mut pos = open_test_position(1.0, 50.0);
        pos.stop_loss = 1.2;
        pos.take_profit = 1.1;
        assert_eq!(pos.exit_reason(1.15), Some(CloseReason::StopLoss));
    }

    #[test]
    fn test_pnl_math() {
        let pos = open_test_position(1.0, 50.0);
        assert_relative_eq!(pos.pnl_percent(0.84), -16.0, epsilon = 1e-9);
        assert_relative_eq!(pos.pnl_usd(0.84), -8.0, epsilon = 1e-9);

        // Exit exactly at the stop threshold: -15% of $50.
        assert_relative_eq!(pos.pnl_usd(0.85), -7.5, epsilon = 1e-9);
        // Exit at take-profit: +30% of $50.
        assert_relative_eq!(pos.pnl_usd(1.30), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_into_closed_record() {
        let pos = open_test_position(1.0, 50.0);
        let exit_time = Utc::now();
        let trade = pos.clone().into_closed(0.85, exit_time, CloseReason::StopLoss);

        assert_eq!(trade.id, pos.id);
        assert_eq!(trade.token, pos.token);
        assert_eq!(trade.reason, CloseReason::StopLoss);
        assert_relative_eq!(trade.pnl_percent, -15.0, epsilon = 1e-9);
        assert_relative_eq!(trade.pnl_usd, -7.5, epsilon = 1e-9);
    }

    #[test]
    fn test_close_reason_wire_format() {
        let json = serde_json::to_string(&CloseReason::StopLoss).unwrap();
        assert_eq!(json, "\"STOP_LOSS\"");
        let json = serde_json::to_string(&CloseReason::TakeProfit).unwrap();
        assert_eq!(json, "\"TAKE_PROFIT\"");
    }

    #[test]
    fn test_position_wire_format_camel_case() {
        let pos = open_test_position(1.0, 50.0);
        let json = serde_json::to_string(&pos).unwrap();
        assert!(json.contains("\"entryPrice\""));
        assert!(json.contains("\"stopLoss\""));
        assert!(json.contains("\"takeProfit\""));
    }
}
