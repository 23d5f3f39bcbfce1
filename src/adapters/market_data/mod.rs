//! Market data adapter: token universe, per-token metrics, spot prices.

mod feed;

pub use feed::MarketDataFeed;
