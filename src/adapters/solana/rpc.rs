//! Solana RPC wrapper.
//!
//! The sync RPC client runs inside `spawn_blocking` so callers stay async.
//! Only the balance query survives here; swap submission goes through the
//! Jupiter adapter.

use std::str::FromStr;
use std::sync::Arc;

use solana_client::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolanaRpcError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

#[derive(Clone)]
pub struct SolanaRpc {
    client: Arc<RpcClient>,
}

impl SolanaRpc {
    pub fn new(rpc_url: String) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(
            rpc_url,
            CommitmentConfig::confirmed(),
        ));
        Self { client }
    }

    /// SOL balance in lamports for a base58 public key.
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaRpcError> {
        let pubkey = Pubkey::from_str(pubkey)
            .map_err(|e| SolanaRpcError::InvalidPublicKey(e.to_string()))?;

        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaRpcError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| SolanaRpcError::Rpc(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_pubkey_is_rejected_before_rpc() {
        let rpc = SolanaRpc::new("https://api.devnet.solana.com".to_string());
        let result = rpc.get_balance("not-a-pubkey").await;
        assert!(matches!(result, Err(SolanaRpcError::InvalidPublicKey(_))));
    }
}
