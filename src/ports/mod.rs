//! Ports Layer - trait definitions for external collaborators.
//!
//! Adapters implement these traits; the engine only sees the traits:
//! - Price feeds (token universe, metrics, spot price)
//! - Swap execution (Jupiter, or simulated for dry-run)
//! - Alert delivery (best-effort, fire-and-forget)

pub mod alerts;
pub mod execution;
pub mod mocks;
pub mod price_feed;

pub use alerts::{AlertSink, NullAlerts};
pub use execution::{ExecutionError, SimulatedExecutor, SwapExecutor, SwapReceipt};
pub use price_feed::{PriceFeed, PriceFeedError, TokenListing, TokenMetrics};
