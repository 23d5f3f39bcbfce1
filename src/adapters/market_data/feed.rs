//! Live market data feed.
//!
//! The token universe and spot prices come from Jupiter; per-token 24h
//! metrics come from DexScreener, which carries the volume and price-change
//! figures Jupiter's free endpoints do not. All requests share one client
//! with a 10-second timeout, and no retries happen here: a failed call means
//! the caller skips that token for the current tick.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::{PriceFeed, PriceFeedError, TokenListing, TokenMetrics};

const JUPITER_TOKEN_LIST_API: &str = "https://tokens.jup.ag/tokens?tags=verified";
const JUPITER_PRICE_API: &str = "https://price.jup.ag/v6/price";
const DEXSCREENER_TOKEN_API: &str = "https://api.dexscreener.com/latest/dex/tokens";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MarketDataFeed {
    client: Client,
}

impl MarketDataFeed {
    pub fn new() -> Result<Self, PriceFeedError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PriceFeedError::Http(e.to_string()))?;
        Ok(Self { client })
    }

    /// The most liquid pair for a token, which DexScreener lists among all
    /// venues trading it.
    fn best_pair(mut pairs: Vec<DexScreenerPair>) -> Option<DexScreenerPair> {
        pairs.sort_by(|a, b| {
            let liq_a = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            let liq_b = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
            liq_b.partial_cmp(&liq_a).unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs.into_iter().next()
    }
}

#[async_trait]
impl PriceFeed for MarketDataFeed {
    async fn token_universe(&self) -> Result<Vec<TokenListing>, PriceFeedError> {
        let response = self
            .client
            .get(JUPITER_TOKEN_LIST_API)
            .send()
            .await
            .map_err(|e| PriceFeedError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| PriceFeedError::Http(e.to_string()))?;

        let tokens: Vec<JupiterToken> = response
            .json()
            .await
            .map_err(|e| PriceFeedError::Parse(e.to_string()))?;

        let universe = tokens
            .into_iter()
            .filter(|t| !is_stablecoin(&t.symbol))
            .map(|t| TokenListing {
                token: t.address,
                symbol: t.symbol,
                daily_volume: t.daily_volume.unwrap_or(0.0),
            })
            .collect();

        Ok(universe)
    }

    async fn metrics(&self, listing: &TokenListing) -> Result<TokenMetrics, PriceFeedError> {
        let url = format!("{}/{}", DEXSCREENER_TOKEN_API, listing.token);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceFeedError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| PriceFeedError::Http(e.to_string()))?;

        let body: DexScreenerResponse = response
            .json()
            .await
            .map_err(|e| PriceFeedError::Parse(e.to_string()))?;

        let pair = Self::best_pair(body.pairs.unwrap_or_default())
            .ok_or_else(|| PriceFeedError::NotAvailable(listing.token.clone()))?;

        let price = pair
            .price_usd
            .as_deref()
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| *p > 0.0)
            .ok_or_else(|| PriceFeedError::NotAvailable(listing.token.clone()))?;

        Ok(TokenMetrics {
            price,
            daily_volume: pair.volume.and_then(|v| v.h24).unwrap_or(listing.daily_volume),
            price_change_24h: pair.price_change.and_then(|c| c.h24).unwrap_or(0.0),
        })
    }

    async fn price(&self, token: &str) -> Result<f64, PriceFeedError> {
        let url = format!("{}?ids={}", JUPITER_PRICE_API, token);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceFeedError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| PriceFeedError::Http(e.to_string()))?;

        let body: PriceResponse = response
            .json()
            .await
            .map_err(|e| PriceFeedError::Parse(e.to_string()))?;

        body.data
            .get(token)
            .map(|d| d.price)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| PriceFeedError::NotAvailable(token.to_string()))
    }
}

/// Stablecoins have no momentum to trade; drop them from the universe.
fn is_stablecoin(symbol: &str) -> bool {
    const STABLES: [&str; 6] = ["USDC", "USDT", "DAI", "USDP", "FRAX", "TUSD"];
    let upper = symbol.to_uppercase();
    STABLES.iter().any(|s| upper == *s)
}

#[derive(Debug, Deserialize)]
struct JupiterToken {
    address: String,
    symbol: String,
    #[serde(rename = "daily_volume")]
    daily_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: HashMap<String, PriceData>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: f64,
}

#[derive(Debug, Deserialize)]
struct DexScreenerResponse {
    #[serde(default)]
    pairs: Option<Vec<DexScreenerPair>>,
}

#[derive(Debug, Deserialize)]
struct DexScreenerPair {
    #[serde(rename = "priceUsd", default)]
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<PairLiquidity>,
    #[serde(default)]
    volume: Option<VolumeWindows>,
    #[serde(rename = "priceChange", default)]
    price_change: Option<ChangeWindows>,
}

#[derive(Debug, Deserialize)]
struct PairLiquidity {
    #[serde(default)]
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VolumeWindows {
    #[serde(default)]
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChangeWindows {
    #[serde(default)]
    h24: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stablecoin() {
        assert!(is_stablecoin("USDC"));
        assert!(is_stablecoin("usdt"));
        assert!(!is_stablecoin("BONK"));
        assert!(!is_stablecoin("SOL"));
    }

    #[test]
    fn test_best_pair_prefers_liquidity() {
        let pairs = vec![
            DexScreenerPair {
                price_usd: Some("1.0".to_string()),
                liquidity: Some(PairLiquidity { usd: Some(10_000.0) }),
                volume: None,
                price_change: None,
            },
            DexScreenerPair {
                price_usd: Some("1.1".to_string()),
                liquidity: Some(PairLiquidity { usd: Some(90_000.0) }),
                volume: None,
                price_change: None,
            },
        ];

        let best = MarketDataFeed::best_pair(pairs).unwrap();
        assert_eq!(best.price_usd.as_deref(), Some("1.1"));
    }

    #[test]
    fn test_best_pair_empty_is_none() {
        assert!(MarketDataFeed::best_pair(Vec::new()).is_none());
    }

    #[test]
    fn test_price_response_parsing() {
        let json = r#"{"data":{"mintA":{"price":0.0123}},"timeTaken":0.5}"#;
        let parsed: PriceResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.data.get("mintA").unwrap().price, 0.0123);
    }

    #[test]
    fn test_dexscreener_pair_parsing() {
        let json = r#"{
            "pairs": [{
                "priceUsd": "0.85",
                "liquidity": {"usd": 250000.0},
                "volume": {"h24": 1200000.0},
                "priceChange": {"h24": 12.5}
            }]
        }"#;
        let parsed: DexScreenerResponse = serde_json::from_str(json).unwrap();
        let pair = &parsed.pairs.unwrap()[0];
        assert_eq!(pair.price_usd.as_deref(), Some("0.85"));
        assert_eq!(pair.volume.as_ref().unwrap().h24, Some(1_200_000.0));
        assert_eq!(pair.price_change.as_ref().unwrap().h24, Some(12.5));
    }
}
