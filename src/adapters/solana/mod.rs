//! Solana adapters: wallet keypair handling and RPC access.

mod rpc;
mod wallet;

pub use rpc::{SolanaRpc, SolanaRpcError};
pub use wallet::{WalletError, WalletManager};
