//! Baseline momentum scorer.

use super::{Score, Scoring};
use crate::ports::TokenMetrics;

/// Placeholder momentum model: scores every token at zero so no entry signal
/// is ever produced. The engine runs its full scan/gate/persist cycle around
/// it, which is what this default is for until a calibrated model replaces it.
#[derive(Debug, Default)]
pub struct MomentumScorer;

impl Scoring for MomentumScorer {
    fn score(&self, _metrics: &TokenMetrics) -> Score {
        Score {
            score: 0.0,
            reasons: vec!["no momentum signal".to_string()],
        }
    }
}
