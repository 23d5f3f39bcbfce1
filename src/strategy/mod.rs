//! Opportunity scoring.
//!
//! The scanner ranks candidates with whatever `Scoring` implementation it is
//! given; the engine never depends on a concrete scoring model.

mod momentum;

pub use momentum::MomentumScorer;

use crate::ports::TokenMetrics;

/// Result of scoring one token.
#[derive(Debug, Clone)]
pub struct Score {
    /// Strategy-specific numeric ranking; higher is better.
    pub score: f64,
    /// Human-readable justifications, carried into the opportunity.
    pub reasons: Vec<String>,
}

/// Injected strategy seam.
pub trait Scoring: Send + Sync {
    fn score(&self, metrics: &TokenMetrics) -> Score;
}
