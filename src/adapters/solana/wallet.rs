//! Wallet keypair loading and generation.
//!
//! Two on-disk formats are accepted: the `solana-keygen` JSON byte array, and
//! the bot's own `wallet.json` object carrying a base58 public key and a
//! base64 private key. The `SOLANA_PRIVATE_KEY` environment variable (base64
//! or base58) takes precedence over any file.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use thiserror::Error;

use crate::config::SolanaSection;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to read wallet file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Unrecognized wallet file format: {0}")]
    Format(String),
    #[error("Invalid private key encoding: {0}")]
    Encoding(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Failed to write wallet file {path}: {reason}")]
    Write { path: String, reason: String },
}

/// `wallet.json` layout produced by `generate-wallet`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalletFile {
    public_key: String,
    private_key: String,
    created_at: String,
}

pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load a keypair, preferring `SOLANA_PRIVATE_KEY` over the wallet file.
    pub fn resolve(config: &SolanaSection) -> Result<Self, WalletError> {
        if let Some(key) = &config.private_key {
            return Self::from_encoded_key(key);
        }
        let path = shellexpand::tilde(&config.keypair_path).to_string();
        Self::from_file(&path)
    }

    /// Load a keypair from either supported file format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| WalletError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        if let Ok(bytes) = serde_json::from_str::<Vec<u8>>(&contents) {
            return Self::from_bytes(&bytes);
        }
        if let Ok(wallet) = serde_json::from_str::<WalletFile>(&contents) {
            return Self::from_encoded_key(&wallet.private_key);
        }

        Err(WalletError::Format(format!(
            "{} is neither a keypair byte array nor a wallet.json object",
            path.display()
        )))
    }

    /// Decode a base64 or base58 private key string.
    pub fn from_encoded_key(encoded: &str) -> Result<Self, WalletError> {
        let trimmed = encoded.trim();
        let bytes = BASE64
            .decode(trimmed)
            .or_else(|_| bs58::decode(trimmed).into_vec())
            .map_err(|e| WalletError::Encoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair =
            Keypair::try_from(bytes).map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;
        Ok(Self { keypair })
    }

    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Generate a fresh wallet and write it as `wallet.json`.
    pub fn generate_to_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let wallet = Self::new_random();
        let file = WalletFile {
            public_key: wallet.public_key(),
            private_key: BASE64.encode(wallet.keypair.to_bytes()),
            created_at: Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| WalletError::Format(e.to_string()))?;
        fs::write(path.as_ref(), json).map_err(|e| WalletError::Write {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(wallet)
    }

    /// Base58 public key.
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }
}
