//! Core business logic: positions, portfolio accounting, risk policy.

pub mod portfolio;
pub mod position;
pub mod risk;

pub use portfolio::{DailyStats, PortfolioState};
pub use position::{CloseReason, ClosedTrade, Position, PositionError};
pub use risk::RiskLimits;
