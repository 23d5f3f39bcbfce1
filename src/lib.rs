//! Momentum trading bot for Solana via the Jupiter aggregator.
//!
//! Position lifecycle and risk-control engine: opens positions from scanner
//! candidates, monitors stop-loss/take-profit thresholds, enforces per-day and
//! per-portfolio risk ceilings, and persists state across restarts.
//!
//! # Modules
//!
//! - `domain`: Core business logic (Position, PortfolioState, RiskGuard)
//! - `ports`: Trait abstractions (PriceFeed, SwapExecutor, AlertSink)
//! - `strategy`: Pluggable opportunity scoring
//! - `state`: Durable JSON persistence (bot state, positions, trade log)
//! - `application`: Scanner, position manager, and the scheduling engine
//! - `adapters`: External implementations (Jupiter, Solana, webhooks)
//! - `config`: Environment-based configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod state;
pub mod strategy;
