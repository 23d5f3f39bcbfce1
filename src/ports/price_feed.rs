use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Price feed error type.
///
/// No retries happen at this layer; callers treat any failure as "skip this
/// token for the current tick".
#[derive(Debug, Error)]
pub enum PriceFeedError {
    #[error("Price not available for {0}")]
    NotAvailable(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Response parsing error: {0}")]
    Parse(String),
}

/// A token known to the feed, with the liquidity figure used for the
/// universe filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListing {
    /// Token mint address.
    pub token: String,
    /// Token symbol.
    pub symbol: String,
    /// 24-hour trading volume in USD.
    pub daily_volume: f64,
}

/// Per-token metrics handed to the scoring function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetrics {
    /// Current price in USDC.
    pub price: f64,
    /// 24-hour trading volume in USD.
    pub daily_volume: f64,
    /// 24-hour price change in percent.
    pub price_change_24h: f64,
}

/// Market data port.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the scannable token universe.
    async fn token_universe(&self) -> Result<Vec<TokenListing>, PriceFeedError>;

    /// Fetch scoring metrics for one universe entry.
    async fn metrics(&self, listing: &TokenListing) -> Result<TokenMetrics, PriceFeedError>;

    /// Fetch the current price for a token.
    async fn price(&self, token: &str) -> Result<f64, PriceFeedError>;
}
