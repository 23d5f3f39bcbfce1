//! Durable persistence for portfolio state, open positions, and the trade log.

mod store;

pub use store::{StateStore, StoreError};
