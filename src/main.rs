//! Momentum trading bot for Solana via the Jupiter aggregator.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use momentum_bot::adapters::alerts::WebhookAlerts;
use momentum_bot::adapters::jupiter::JupiterSwapExecutor;
use momentum_bot::adapters::market_data::MarketDataFeed;
use momentum_bot::adapters::solana::{SolanaRpc, WalletManager};
use momentum_bot::application::TradingEngine;
use momentum_bot::config::Config;
use momentum_bot::ports::{AlertSink, NullAlerts, SimulatedExecutor, SwapExecutor};
use momentum_bot::state::StateStore;
use momentum_bot::strategy::MomentumScorer;

/// Below this the wallet cannot reliably pay transaction fees.
const LOW_SOL_LAMPORTS: u64 = 50_000_000;

#[derive(Parser)]
#[command(name = "momentum-bot", version, about = "Momentum trading bot for Solana/Jupiter")]
struct Cli {
    /// Info-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Debug-level logging
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the trading engine until a shutdown signal
    Run,
    /// Print persisted portfolio state, open positions, and trade history
    Status,
    /// Generate a new wallet file with funding instructions
    GenerateWallet {
        /// Where to write the wallet file
        #[arg(long, default_value = "./wallet.json")]
        output: String,
    },
    /// Check the wallet's SOL balance
    Balance,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Command::Run => run_command().await,
        Command::Status => status_command(),
        Command::GenerateWallet { output } => generate_wallet_command(&output),
        Command::Balance => balance_command().await,
    }
}

fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt().with_env_filter(filter).init();
}

async fn run_command() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Solana Momentum Trading Bot");
    if config.trading.dry_run || !config.trading.trading_enabled {
        tracing::warn!("DRY RUN MODE - no real swaps will be executed");
    }

    let store = StateStore::new(&config.paths);
    let feed = Arc::new(MarketDataFeed::new().context("Failed to create market data client")?);
    let executor = build_executor(&config)?;
    let alerts = build_alerts(&config);
    let scorer = Arc::new(MomentumScorer);

    let mut engine = TradingEngine::new(
        config.clone(),
        store,
        feed,
        executor,
        alerts.clone(),
        scorer,
    );

    alerts
        .send(
            "🚀 Momentum Bot Started",
            &format!(
                "Capital: ${:.2}\nMax positions: {}\nTrading: {}\nDry run: {}",
                config.trading.starting_capital,
                config.trading.max_positions,
                config.trading.trading_enabled,
                config.trading.dry_run
            ),
        )
        .await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        shutdown_tx.send(true).ok();
    });

    engine.run(shutdown_rx).await?;
    tracing::info!("Bot stopped");
    Ok(())
}

/// Live trading requires a wallet; its absence is a fatal startup error.
/// Dry-run and trading-disabled modes always get the simulated executor.
fn build_executor(config: &Config) -> Result<Arc<dyn SwapExecutor>> {
    if config.trading.dry_run || !config.trading.trading_enabled {
        if let Err(e) = WalletManager::resolve(&config.solana) {
            tracing::warn!("No wallet available ({}), fine for simulation", e);
        }
        return Ok(Arc::new(SimulatedExecutor));
    }

    let wallet = WalletManager::resolve(&config.solana).with_context(|| {
        format!(
            "Live trading requires a wallet; set SOLANA_PRIVATE_KEY or create one with \
             `momentum-bot generate-wallet --output {}`",
            config.solana.keypair_path
        )
    })?;
    tracing::info!("Wallet loaded: {}", wallet.public_key());

    let executor = JupiterSwapExecutor::new(wallet.public_key())
        .context("Failed to create Jupiter client")?;
    Ok(Arc::new(executor))
}

fn build_alerts(config: &Config) -> Arc<dyn AlertSink> {
    match WebhookAlerts::from_config(&config.alerts) {
        Some(alerts) => Arc::new(alerts),
        None => {
            tracing::warn!("No alert channels configured");
            Arc::new(NullAlerts)
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                tokio::signal::ctrl_c().await.ok();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

fn status_command() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = StateStore::new(&config.paths);

    let state = store.load_state(config.trading.starting_capital);
    let positions = store.load_positions();
    let trades = store.load_trades();

    println!("Portfolio value: ${:.2}", state.portfolio_value);
    println!("Total P&L:       ${:+.2}", state.total_pnl);
    println!(
        "Today ({}):  {} trades, +${:.2} / -${:.2}",
        state.daily_stats.date, state.daily_stats.trades, state.daily_stats.profit, state.daily_stats.loss
    );

    println!("\nOpen positions: {}", positions.len());
    for p in &positions {
        println!(
            "  {} size ${:.2} entry ${:.6} stop ${:.6} take ${:.6}",
            p.symbol, p.size, p.entry_price, p.stop_loss, p.take_profit
        );
    }

    println!("\nClosed trades: {}", trades.len());
    for t in trades.iter().rev().take(10) {
        println!(
            "  {} [{}] {:+.2}% (${:+.2})",
            t.symbol, t.reason, t.pnl_percent, t.pnl_usd
        );
    }

    Ok(())
}

fn generate_wallet_command(output: &str) -> Result<()> {
    let path = shellexpand::tilde(output).to_string();
    if std::path::Path::new(&path).exists() {
        anyhow::bail!("{} already exists, refusing to overwrite", path);
    }

    let wallet = WalletManager::generate_to_file(&path)
        .with_context(|| format!("Failed to write wallet to {}", path))?;

    println!("Wallet generated: {}", path);
    println!("\nPublic key (send USDC here):\n{}\n", wallet.public_key());
    println!("Next steps:");
    println!("  1. Fund with SOL for transaction fees (0.05-0.1 SOL)");
    println!("  2. Fund with USDC for trading capital");
    println!("  3. Back up {} securely and never commit it", path);
    Ok(())
}

async fn balance_command() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let wallet = WalletManager::resolve(&config.solana).context("Failed to load wallet")?;
    let rpc = SolanaRpc::new(config.solana.rpc_url.clone());

    println!("Public key: {}", wallet.public_key());

    let lamports = rpc
        .get_balance(&wallet.public_key())
        .await
        .context("Failed to fetch balance")?;
    println!("SOL balance: {:.4} SOL", lamports as f64 / 1e9);

    if lamports < LOW_SOL_LAMPORTS {
        println!("LOW SOL: fund with at least 0.1 SOL for transaction fees");
    }
    Ok(())
}
