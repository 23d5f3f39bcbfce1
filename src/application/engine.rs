//! Trading Engine
//!
//! Drives three independently timed activities over one task:
//! heartbeat (persist snapshot), position check (exit evaluation), and market
//! scan (entry evaluation). Multiplexing them with `select!` on a single task
//! serializes every mutation of the portfolio state and the open-position
//! set, so `enter` and `close` can never interleave.
//!
//! A tick failure is logged and the timers keep running; an errored scan tick
//! additionally pushes the next scan out by 30 seconds. The portfolio stop
//! latches the engine into a halted state that admits no further ticks and
//! alerts exactly once. A stop request lets the in-flight tick finish, then
//! performs one final save.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::Config;
use crate::domain::{portfolio::today_utc, CloseReason, PortfolioState, Position, RiskLimits};
use crate::ports::{AlertSink, PriceFeed, SwapExecutor};
use crate::state::{StateStore, StoreError};
use crate::strategy::Scoring;

use super::manager::{position_size, PositionManager};
use super::scanner::OpportunityScanner;

/// USDC mint address on Solana, the quote side of every swap.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Extra delay before the next scan after an errored scan tick.
const SCAN_ERROR_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),
}

pub struct TradingEngine {
    config: Config,
    limits: RiskLimits,
    scanner: OpportunityScanner,
    state: PortfolioState,
    manager: PositionManager,
    store: StateStore,
    feed: Arc<dyn PriceFeed>,
    executor: Arc<dyn SwapExecutor>,
    alerts: Arc<dyn AlertSink>,
    scorer: Arc<dyn Scoring>,
    halted: bool,
}

impl TradingEngine {
    /// Build the engine, recovering persisted state and open positions.
    pub fn new(
        config: Config,
        store: StateStore,
        feed: Arc<dyn PriceFeed>,
        executor: Arc<dyn SwapExecutor>,
        alerts: Arc<dyn AlertSink>,
        scorer: Arc<dyn Scoring>,
    ) -> Self {
        let state = store.load_state(config.trading.starting_capital);
        let manager = PositionManager::from_loaded(store.load_positions());
        let limits = RiskLimits {
            starting_capital: config.trading.starting_capital,
            max_positions: config.trading.max_positions,
            max_daily_trades: config.trading.max_daily_trades,
            portfolio_stop_loss_pct: config.trading.portfolio_stop_loss_pct,
        };
        let scanner = OpportunityScanner::new(
            config.trading.min_liquidity,
            config.trading.momentum_threshold,
        );

        Self {
            config,
            limits,
            scanner,
            state,
            manager,
            store,
            feed,
            executor,
            alerts,
            scorer,
            halted: false,
        }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn open_positions(&self) -> &[Position] {
        self.manager.open_positions()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run until a stop is signalled, then save once and return.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), EngineError> {
        let scan_period = self.config.intervals.scan();
        let mut next_scan = Instant::now() + scan_period;

        let mut check = time::interval(self.config.intervals.check());
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat = time::interval(self.config.intervals.heartbeat());
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Engine running (scan {}s, check {}s, heartbeat {}s, trading {}, dry-run {})",
            self.config.intervals.scan_secs,
            self.config.intervals.check_secs,
            self.config.intervals.heartbeat_secs,
            self.config.trading.trading_enabled,
            self.config.trading.dry_run,
        );

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("Stop requested, finishing up");
                    break;
                }
                _ = time::sleep_until(next_scan) => {
                    next_scan = Instant::now() + scan_period;
                    if !self.halted {
                        if let Err(e) = self.scan_tick().await {
                            tracing::error!("Scan tick failed: {}", e);
                            next_scan += SCAN_ERROR_BACKOFF;
                        }
                    }
                }
                _ = check.tick() => {
                    if !self.halted {
                        if let Err(e) = self.check_tick().await {
                            tracing::error!("Position check failed: {}", e);
                        }
                    }
                }
                _ = heartbeat.tick() => {
                    if !self.halted {
                        if let Err(e) = self.heartbeat_tick() {
                            tracing::error!("Heartbeat failed: {}", e);
                        }
                    }
                }
            }
        }

        self.final_save();
        Ok(())
    }

    /// One market-scan cycle: daily rollover, portfolio-stop check, scan,
    /// risk gates, entries.
    pub async fn scan_tick(&mut self) -> Result<(), EngineError> {
        if self.state.daily_stats.rollover_if_needed(&today_utc()) {
            tracing::info!("New trading day {}, daily counters reset", self.state.daily_stats.date);
            self.store.save_state(&mut self.state)?;
        }

        if self.limits.portfolio_stop_triggered(&self.state) {
            self.halt().await?;
            return Ok(());
        }

        let opportunities = self.scanner.scan(self.feed.as_ref(), self.scorer.as_ref()).await;

        for opportunity in &opportunities {
            if !self
                .limits
                .can_enter_new_position(self.manager.open_count(), &self.state)
            {
                tracing::debug!("Risk limits block further entries this tick");
                break;
            }
            if self.manager.holds(&opportunity.token) {
                continue;
            }

            if self.config.trading.dry_run || !self.config.trading.trading_enabled {
                tracing::info!(
                    "[DRY RUN] Would enter {} @ ${:.6} (score {:.1})",
                    opportunity.symbol,
                    opportunity.price,
                    opportunity.score
                );
                continue;
            }

            let size = position_size(&self.state, &self.config.trading);
            if let Err(e) = self
                .executor
                .swap(USDC_MINT, &opportunity.token, size)
                .await
            {
                tracing::warn!("Swap failed for {}, skipping entry: {}", opportunity.symbol, e);
                continue;
            }

            match self
                .manager
                .enter(opportunity, &mut self.state, &self.config.trading)
            {
                Ok(Some(position)) => {
                    self.store.save_positions(self.manager.open_positions())?;
                    self.store.save_state(&mut self.state)?;
                    self.alerts
                        .send(
                            &format!("✅ Position Opened: {}", position.symbol),
                            &format!(
                                "Size: ${:.2}\nEntry: ${:.6}\nStop: ${:.6}\nTake: ${:.6}",
                                position.size,
                                position.entry_price,
                                position.stop_loss,
                                position.take_profit
                            ),
                        )
                        .await;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Entry rejected for {}: {}", opportunity.symbol, e),
            }
        }

        Ok(())
    }

    /// One position-check cycle: evaluate every open position against its
    /// thresholds. A failed price fetch skips that position for this tick.
    pub async fn check_tick(&mut self) -> Result<(), EngineError> {
        let snapshot: Vec<Position> = self.manager.open_positions().to_vec();

        for position in snapshot {
            let price = match self.feed.price(&position.token).await {
                Ok(price) => price,
                Err(e) => {
                    tracing::debug!("No price for {} this tick: {}", position.symbol, e);
                    continue;
                }
            };

            let Some(reason) = position.exit_reason(price) else {
                continue;
            };

            // Exits are booked at the threshold level the order sits at, not
            // at the tick that crossed it.
            let exit_price = match reason {
                CloseReason::StopLoss => position.stop_loss,
                CloseReason::TakeProfit => position.take_profit,
                CloseReason::Manual => price,
            };

            // Sell back to USDC before recording the close; if the swap
            // fails, the position stays open for the next tick.
            if let Err(e) = self
                .executor
                .swap(&position.token, USDC_MINT, position.size)
                .await
            {
                tracing::warn!("Exit swap failed for {}: {}", position.symbol, e);
                continue;
            }

            if let Some(trade) = self.manager.close(position.id, exit_price, reason, &mut self.state) {
                self.store.append_trade(&trade)?;
                self.store.save_positions(self.manager.open_positions())?;
                self.store.save_state(&mut self.state)?;

                let title = match trade.reason {
                    CloseReason::StopLoss => format!("🔴 Stop Loss: {}", trade.symbol),
                    CloseReason::TakeProfit => format!("🟢 Take Profit: {}", trade.symbol),
                    CloseReason::Manual => format!("Closed: {}", trade.symbol),
                };
                self.alerts
                    .send(
                        &title,
                        &format!(
                            "Exit: ${:.6}\nP&L: {:+.2}% (${:+.2})\nTotal P&L: ${:+.2}",
                            trade.exit_price, trade.pnl_percent, trade.pnl_usd, self.state.total_pnl
                        ),
                    )
                    .await;
            }
        }

        Ok(())
    }

    /// One heartbeat cycle: persist the current snapshot.
    pub fn heartbeat_tick(&mut self) -> Result<(), EngineError> {
        self.store.save_state(&mut self.state)?;
        tracing::info!(
            "Heartbeat: {} open, total P&L ${:+.2}, value ${:.2}",
            self.manager.open_count(),
            self.state.total_pnl,
            self.state.portfolio_value
        );
        Ok(())
    }

    /// Latch the portfolio stop: no further ticks are admitted, one alert is
    /// emitted, open positions are left untouched.
    async fn halt(&mut self) -> Result<(), EngineError> {
        if self.halted {
            return Ok(());
        }
        self.halted = true;

        let drawdown = self.state.pnl_percent_of(self.limits.starting_capital);
        tracing::error!(
            "PORTFOLIO STOP-LOSS: {:.2}% drawdown (limit -{:.1}%), halting new trading",
            drawdown,
            self.limits.portfolio_stop_loss_pct
        );
        self.alerts
            .send(
                "🛑 PORTFOLIO STOP-LOSS TRIGGERED",
                &format!(
                    "Drawdown: {:.2}%\nTotal P&L: ${:+.2}\nOpen positions are left untouched; trading halted.",
                    drawdown, self.state.total_pnl
                ),
            )
            .await;
        self.store.save_state(&mut self.state)?;
        Ok(())
    }

    fn final_save(&mut self) {
        if let Err(e) = self.store.save_state(&mut self.state) {
            tracing::error!("Final state save failed: {}", e);
        }
        if let Err(e) = self.store.save_positions(self.manager.open_positions()) {
            tracing::error!("Final positions save failed: {}", e);
        }
        tracing::info!("Final state saved, engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AlertsSection, IntervalsSection, PathsSection, SolanaSection, TradingSection,
    };
    use crate::ports::mocks::{ChangeScorer, MockPriceFeed, RecordingAlerts, RecordingExecutor};
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            trading: TradingSection {
                starting_capital: 500.0,
                max_position_size: 50.0,
                max_positions: 3,
                stop_loss_pct: 15.0,
                take_profit_pct: 30.0,
                portfolio_stop_loss_pct: 20.0,
                min_liquidity: 100_000.0,
                momentum_threshold: 5.0,
                max_daily_trades: 10,
                trading_enabled: true,
                dry_run: false,
            },
            intervals: IntervalsSection {
                scan_secs: 30,
                check_secs: 10,
                heartbeat_secs: 300,
            },
            paths: PathsSection {
                state_file: dir.path().join("bot-state.json").display().to_string(),
                positions_file: dir.path().join("positions.json").display().to_string(),
                trades_file: dir.path().join("trades.json").display().to_string(),
            },
            solana: SolanaSection {
                rpc_url: "https://api.devnet.solana.com".to_string(),
                keypair_path: "./wallet.json".to_string(),
                private_key: None,
            },
            alerts: AlertsSection::default(),
        }
    }

    struct Harness {
        engine: TradingEngine,
        feed: Arc<MockPriceFeed>,
        alerts: Arc<RecordingAlerts>,
        executor: Arc<RecordingExecutor>,
        _dir: TempDir,
    }

    fn harness(feed: MockPriceFeed, mutate: impl FnOnce(&mut Config)) -> Harness {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        mutate(&mut config);

        let feed = Arc::new(feed);
        let alerts = Arc::new(RecordingAlerts::new());
        let executor = Arc::new(RecordingExecutor::new());
        let store = StateStore::new(&config.paths);
        let engine = TradingEngine::new(
            config,
            store,
            feed.clone(),
            executor.clone(),
            alerts.clone(),
            Arc::new(ChangeScorer),
        );
        Harness {
            engine,
            feed,
            alerts,
            executor,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_scan_enters_best_opportunity() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |_| {});

        h.engine.scan_tick().await.unwrap();

        assert_eq!(h.engine.open_positions().len(), 1);
        assert_eq!(h.engine.state().daily_stats.trades, 1);
        assert_eq!(h.executor.swaps().len(), 1);
        assert_eq!(h.alerts.count_titled("Position Opened"), 1);
    }

    #[tokio::test]
    async fn test_dry_run_refuses_entry() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |c| c.trading.dry_run = true);

        h.engine.scan_tick().await.unwrap();

        assert!(h.engine.open_positions().is_empty());
        assert_eq!(h.engine.state().daily_stats.trades, 0);
        assert!(h.executor.swaps().is_empty());
    }

    #[tokio::test]
    async fn test_trading_disabled_refuses_entry() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |c| c.trading.trading_enabled = false);

        h.engine.scan_tick().await.unwrap();
        assert!(h.engine.open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_failed_entry_swap_skips_position() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |_| {});
        h.executor.fail_next(true);

        h.engine.scan_tick().await.unwrap();

        assert!(h.engine.open_positions().is_empty());
        assert_eq!(h.engine.state().daily_stats.trades, 0);
    }

    #[tokio::test]
    async fn test_check_closes_on_stop_loss() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |_| {});

        h.engine.scan_tick().await.unwrap();
        h.feed.set_price("mintA", 0.84);
        h.engine.check_tick().await.unwrap();

        assert!(h.engine.open_positions().is_empty());
        assert_eq!(h.alerts.count_titled("Stop Loss"), 1);
        // Entry swap + exit swap.
        assert_eq!(h.executor.swaps().len(), 2);
        assert_eq!(h.executor.swaps()[1].1, USDC_MINT);
    }

    #[tokio::test]
    async fn test_check_skips_position_on_price_failure() {
        let feed = MockPriceFeed::new().with_token("mintA", "AAA", 200_000.0, 1.0, 20.0);
        let mut h = harness(feed, |_| {});

        h.engine.scan_tick().await.unwrap();
        h.feed.drop_price("mintA");
        h.engine.check_tick().await.unwrap();

        // Still open; next tick with a price works again.
        assert_eq!(h.engine.open_positions().len(), 1);
        h.feed.set_price("mintA", 1.35);
        h.engine.check_tick().await.unwrap();
        assert!(h.engine.open_positions().is_empty());
        assert_eq!(h.alerts.count_titled("Take Profit"), 1);
    }

    #[tokio::test]
    async fn test_halt_alerts_exactly_once() {
        let feed = MockPriceFeed::new();
        let mut h = harness(feed, |_| {});

        // Force the drawdown past -20% of $500.
        h.engine.state.total_pnl = -120.0;

        h.engine.scan_tick().await.unwrap();
        assert!(h.engine.is_halted());
        h.engine.scan_tick().await.unwrap();
        h.engine.scan_tick().await.unwrap();

        assert_eq!(h.alerts.count_titled("PORTFOLIO STOP-LOSS"), 1);
        // Never auto-liquidates.
        assert!(h.engine.open_positions().is_empty());
    }
}
