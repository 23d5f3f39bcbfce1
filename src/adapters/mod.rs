//! Adapters Layer - concrete implementations of the ports.
//!
//! Everything that touches the network lives here: market data (Jupiter +
//! DexScreener), swap execution (Jupiter), Solana wallet/RPC, and webhook
//! alert delivery.

pub mod alerts;
pub mod jupiter;
pub mod market_data;
pub mod solana;
