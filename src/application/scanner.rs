//! Opportunity Scanner
//!
//! Produces a ranked, deduplicated list of entry candidates from the token
//! universe. Per-token failures skip that token; a universe fetch failure
//! yields an empty scan. Errors never propagate out of a scan tick.

use std::collections::HashSet;

use crate::ports::PriceFeed;
use crate::strategy::Scoring;

/// Candidates returned per scan.
const MAX_OPPORTUNITIES: usize = 5;

/// An entry candidate for the current scan tick. Never persisted.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Token mint address.
    pub token: String,
    pub symbol: String,
    /// Price observed during the scan.
    pub price: f64,
    /// Momentum score from the injected strategy.
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Scanner over a pluggable scoring function.
#[derive(Debug, Clone)]
pub struct OpportunityScanner {
    /// Minimum 24h volume for a universe entry to be considered.
    pub min_liquidity: f64,
    /// Scores at or below this are discarded.
    pub momentum_threshold: f64,
}

impl OpportunityScanner {
    pub fn new(min_liquidity: f64, momentum_threshold: f64) -> Self {
        Self {
            min_liquidity,
            momentum_threshold,
        }
    }

    /// One scan pass: filter by liquidity, fetch metrics, score, rank.
    ///
    /// The result is sorted descending by score with arrival order preserved
    /// on ties, truncated to the top 5.
    pub async fn scan(&self, feed: &dyn PriceFeed, scorer: &dyn Scoring) -> Vec<Opportunity> {
        let universe = match feed.token_universe().await {
            Ok(universe) => universe,
            Err(e) => {
                tracing::warn!("Universe fetch failed, skipping scan: {}", e);
                return Vec::new();
            }
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut opportunities = Vec::new();

        for listing in &universe {
            if listing.daily_volume < self.min_liquidity {
                continue;
            }
            if !seen.insert(listing.token.clone()) {
                continue;
            }

            let metrics = match feed.metrics(listing).await {
                Ok(metrics) => metrics,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", listing.symbol, e);
                    continue;
                }
            };

            let score = scorer.score(&metrics);
            if score.score <= self.momentum_threshold {
                continue;
            }

            opportunities.push(Opportunity {
                token: listing.token.clone(),
                symbol: listing.symbol.clone(),
                price: metrics.price,
                score: score.score,
                reasons: score.reasons,
            });
        }

        // Stable sort keeps arrival order for equal scores.
        opportunities.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        opportunities.truncate(MAX_OPPORTUNITIES);

        if !opportunities.is_empty() {
            tracing::info!(
                "Scan found {} opportunit{}: {}",
                opportunities.len(),
                if opportunities.len() == 1 { "y" } else { "ies" },
                opportunities
                    .iter()
                    .map(|o| format!("{} ({:.1})", o.symbol, o.score))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        opportunities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{ChangeScorer, MockPriceFeed};

    fn scanner() -> OpportunityScanner {
        OpportunityScanner::new(100_000.0, 5.0)
    }

    #[tokio::test]
    async fn test_filters_below_min_liquidity() {
        let feed = MockPriceFeed::new()
            .with_token("mintA", "AAA", 50_000.0, 1.0, 20.0)
            .with_token("mintB", "BBB", 150_000.0, 2.0, 20.0);

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].symbol, "BBB");
    }

    #[tokio::test]
    async fn test_skips_failed_fetch_without_failing_scan() {
        let feed = MockPriceFeed::new()
            .with_token("mintA", "AAA", 150_000.0, 1.0, 20.0)
            .with_token("mintB", "BBB", 150_000.0, 2.0, 20.0);
        feed.drop_price("mintA");

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].symbol, "BBB");
    }

    #[tokio::test]
    async fn test_discards_scores_at_or_below_threshold() {
        let feed = MockPriceFeed::new()
            .with_token("mintA", "AAA", 150_000.0, 1.0, 5.0)
            .with_token("mintB", "BBB", 150_000.0, 2.0, 5.1);

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].symbol, "BBB");
    }

    #[tokio::test]
    async fn test_ranked_descending_and_truncated() {
        let mut feed = MockPriceFeed::new();
        for (i, change) in [12.0, 30.0, 8.0, 25.0, 19.0, 40.0, 11.0].iter().enumerate() {
            feed = feed.with_token(
                &format!("mint{}", i),
                &format!("T{}", i),
                200_000.0,
                1.0,
                *change,
            );
        }

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].score, 40.0);
        assert_eq!(result[1].score, 30.0);
        let scores: Vec<f64> = result.iter().map(|o| o.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
        assert_eq!(scores, sorted);
    }

    #[tokio::test]
    async fn test_ties_keep_arrival_order() {
        let feed = MockPriceFeed::new()
            .with_token("mintA", "AAA", 150_000.0, 1.0, 10.0)
            .with_token("mintB", "BBB", 150_000.0, 2.0, 10.0);

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result[0].symbol, "AAA");
        assert_eq!(result[1].symbol, "BBB");
    }

    #[tokio::test]
    async fn test_duplicate_universe_entries_deduplicated() {
        let feed = MockPriceFeed::new()
            .with_token("mintA", "AAA", 150_000.0, 1.0, 10.0)
            .with_token("mintA", "AAA", 150_000.0, 1.0, 10.0);

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_universe_failure_yields_empty_scan() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 150_000.0, 1.0, 10.0);
        feed.fail_universe(true);

        let result = scanner().scan(&feed, &ChangeScorer).await;
        assert!(result.is_empty());
    }
}
