//! Jupiter aggregator adapter: quote fetching and swap building.

mod swap;

pub use swap::JupiterSwapExecutor;
