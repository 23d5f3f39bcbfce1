//! Recording mock implementations of the ports, used by engine and scanner
//! tests. Deterministic, no network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::alerts::AlertSink;
use super::execution::{ExecutionError, SwapExecutor, SwapReceipt};
use super::price_feed::{PriceFeed, PriceFeedError, TokenListing, TokenMetrics};
use crate::strategy::{Score, Scoring};

/// Mock price feed backed by in-memory tables. Prices can be moved between
/// ticks; tokens with no price entry fail with `NotAvailable`.
#[derive(Debug, Default)]
pub struct MockPriceFeed {
    universe: Arc<Mutex<Vec<TokenListing>>>,
    prices: Arc<Mutex<HashMap<String, f64>>>,
    changes: Arc<Mutex<HashMap<String, f64>>>,
    universe_fails: Arc<Mutex<bool>>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a universe entry with a current price and 24h change.
    pub fn with_token(self, token: &str, symbol: &str, volume: f64, price: f64, change: f64) -> Self {
        self.universe.lock().unwrap().push(TokenListing {
            token: token.to_string(),
            symbol: symbol.to_string(),
            daily_volume: volume,
        });
        self.prices.lock().unwrap().insert(token.to_string(), price);
        self.changes.lock().unwrap().insert(token.to_string(), change);
        self
    }

    /// Move a token's price (simulates a later tick).
    pub fn set_price(&self, token: &str, price: f64) {
        self.prices.lock().unwrap().insert(token.to_string(), price);
    }

    /// Make price lookups for a token fail until a new price is set.
    pub fn drop_price(&self, token: &str) {
        self.prices.lock().unwrap().remove(token);
    }

    /// Make the next universe fetches fail.
    pub fn fail_universe(&self, fail: bool) {
        *self.universe_fails.lock().unwrap() = fail;
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn token_universe(&self) -> Result<Vec<TokenListing>, PriceFeedError> {
        if *self.universe_fails.lock().unwrap() {
            return Err(PriceFeedError::Http("universe unavailable".to_string()));
        }
        Ok(self.universe.lock().unwrap().clone())
    }

    async fn metrics(&self, listing: &TokenListing) -> Result<TokenMetrics, PriceFeedError> {
        let price = self.price(&listing.token).await?;
        let change = self
            .changes
            .lock()
            .unwrap()
            .get(&listing.token)
            .copied()
            .unwrap_or(0.0);
        Ok(TokenMetrics {
            price,
            daily_volume: listing.daily_volume,
            price_change_24h: change,
        })
    }

    async fn price(&self, token: &str) -> Result<f64, PriceFeedError> {
        self.prices
            .lock()
            .unwrap()
            .get(token)
            .copied()
            .ok_or_else(|| PriceFeedError::NotAvailable(token.to_string()))
    }
}

/// Alert sink that records every message for assertions.
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of alerts whose title contains `needle`.
    pub fn count_titled(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(title, _)| title.contains(needle))
            .count()
    }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn send(&self, title: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
    }
}

/// Executor that records swap calls and returns simulated receipts.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    swaps: Arc<Mutex<Vec<(String, String, f64)>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swaps(&self) -> Vec<(String, String, f64)> {
        self.swaps.lock().unwrap().clone()
    }

    pub fn fail_next(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl SwapExecutor for RecordingExecutor {
    async fn swap(
        &self,
        input_token: &str,
        output_token: &str,
        amount_usd: f64,
    ) -> Result<SwapReceipt, ExecutionError> {
        if *self.fail.lock().unwrap() {
            return Err(ExecutionError::Submit("injected failure".to_string()));
        }
        self.swaps.lock().unwrap().push((
            input_token.to_string(),
            output_token.to_string(),
            amount_usd,
        ));
        Ok(SwapReceipt {
            signature: None,
            input_token: input_token.to_string(),
            output_token: output_token.to_string(),
            amount_usd,
            simulated: true,
        })
    }
}

/// Scorer that uses the 24h price change as the momentum score, making test
/// rankings explicit.
#[derive(Debug, Default)]
pub struct ChangeScorer;

impl Scoring for ChangeScorer {
    fn score(&self, metrics: &TokenMetrics) -> Score {
        Score {
            score: metrics.price_change_24h,
            reasons: vec![format!("24h change {:.1}%", metrics.price_change_24h)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_feed_price_and_failure() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.5, 10.0);

        assert_eq!(feed.price("mintA").await.unwrap(), 1.5);
        assert!(matches!(
            feed.price("unknown").await,
            Err(PriceFeedError::NotAvailable(_))
        ));

        feed.drop_price("mintA");
        assert!(feed.price("mintA").await.is_err());
    }

    #[tokio::test]
    async fn test_recording_alerts_counts() {
        let alerts = RecordingAlerts::new();
        alerts.send("🛑 PORTFOLIO STOP", "down").await;
        alerts.send("✅ Entered BONK", "ok").await;

        assert_eq!(alerts.sent().len(), 2);
        assert_eq!(alerts.count_titled("PORTFOLIO STOP"), 1);
    }
}
