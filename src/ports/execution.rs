use async_trait::async_trait;
use thiserror::Error;

/// Swap execution error type.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Quote failed: {0}")]
    Quote(String),
    #[error("Swap submission failed: {0}")]
    Submit(String),
    #[error("Swap rejected: {0}")]
    Rejected(String),
}

/// Handle for a completed (or simulated) swap.
#[derive(Debug, Clone)]
pub struct SwapReceipt {
    /// Transaction signature, absent for simulated swaps.
    pub signature: Option<String>,
    pub input_token: String,
    pub output_token: String,
    pub amount_usd: f64,
    pub simulated: bool,
}

/// Swap execution port.
#[async_trait]
pub trait SwapExecutor: Send + Sync {
    /// Swap `amount_usd` worth of `input_token` into `output_token`.
    async fn swap(
        &self,
        input_token: &str,
        output_token: &str,
        amount_usd: f64,
    ) -> Result<SwapReceipt, ExecutionError>;
}

/// Executor used when dry-run is on or trading is disabled: logs the intent
/// and returns a simulated receipt, no network traffic.
#[derive(Debug, Default)]
pub struct SimulatedExecutor;

#[async_trait]
impl SwapExecutor for SimulatedExecutor {
    async fn swap(
        &self,
        input_token: &str,
        output_token: &str,
        amount_usd: f64,
    ) -> Result<SwapReceipt, ExecutionError> {
        tracing::info!(
            "[SIMULATED] swap ${:.2} {} -> {}",
            amount_usd,
            input_token,
            output_token
        );
        Ok(SwapReceipt {
            signature: None,
            input_token: input_token.to_string(),
            output_token: output_token.to_string(),
            amount_usd,
            simulated: true,
        })
    }
}
