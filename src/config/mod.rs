//! Configuration loading and validation.

mod loader;

pub use loader::{
    AlertsSection, Config, ConfigError, IntervalsSection, PathsSection, SolanaSection,
    TradingSection,
};
