//! State Store
//!
//! Crash-safe JSON persistence across three files:
//! - `bot-state.json`: aggregate PortfolioState, heartbeat-stamped on save
//! - `positions.json`: open-position set (updates far more frequently)
//! - `trades.json`: append-only ClosedTrade log
//!
//! Writes go to a temp file and are renamed into place, so a crash mid-write
//! leaves the previous snapshot intact. A missing or corrupt file on load is
//! a fresh start, not an error.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::config::PathsSection;
use crate::domain::{ClosedTrade, PortfolioState, Position};

/// Downtime above this many seconds gets a warning on load.
const DOWNTIME_WARN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },
    #[error("Failed to serialize state: {0}")]
    Serialize(String),
}

/// Persistence handle for all three stores.
#[derive(Debug, Clone)]
pub struct StateStore {
    state_path: PathBuf,
    positions_path: PathBuf,
    trades_path: PathBuf,
}

impl StateStore {
    pub fn new(paths: &PathsSection) -> Self {
        Self {
            state_path: PathBuf::from(&paths.state_file),
            positions_path: PathBuf::from(&paths.positions_file),
            trades_path: PathBuf::from(&paths.trades_file),
        }
    }

    /// Load the aggregate state, falling back to a fresh default (persisted
    /// immediately) when the file is missing or unreadable. Logs a downtime
    /// warning when the last heartbeat is older than 60 seconds.
    pub fn load_state(&self, starting_capital: f64) -> PortfolioState {
        match fs::read_to_string(&self.state_path) {
            Ok(content) => match serde_json::from_str::<PortfolioState>(&content) {
                Ok(state) => {
                    tracing::info!("State loaded from {}", self.state_path.display());
                    if let Some(last) = state.last_heartbeat {
                        let downtime = downtime_seconds(last, Utc::now().timestamp_millis());
                        if downtime > DOWNTIME_WARN_SECS {
                            tracing::warn!("Bot was down for {} seconds", downtime);
                        }
                    }
                    state
                }
                Err(e) => {
                    tracing::warn!(
                        "State file {} is corrupt ({}), starting fresh",
                        self.state_path.display(),
                        e
                    );
                    self.fresh_state(starting_capital)
                }
            },
            Err(_) => {
                tracing::info!("No previous state found, starting fresh");
                self.fresh_state(starting_capital)
            }
        }
    }

    fn fresh_state(&self, starting_capital: f64) -> PortfolioState {
        let mut state = PortfolioState::new(starting_capital);
        if let Err(e) = self.save_state(&mut state) {
            tracing::error!("Failed to persist initial state: {}", e);
        }
        state
    }

    /// Persist the aggregate state, stamping the heartbeat first.
    pub fn save_state(&self, state: &mut PortfolioState) -> Result<(), StoreError> {
        state.last_heartbeat = Some(Utc::now().timestamp_millis());
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        write_atomic(&self.state_path, &content)
    }

    /// Load the open-position set; missing or corrupt file yields an empty set.
    pub fn load_positions(&self) -> Vec<Position> {
        match fs::read_to_string(&self.positions_path) {
            Ok(content) => match serde_json::from_str::<Vec<Position>>(&content) {
                Ok(positions) => {
                    if !positions.is_empty() {
                        tracing::info!("Recovered {} open position(s)", positions.len());
                    }
                    positions
                }
                Err(e) => {
                    tracing::warn!(
                        "Positions file {} is corrupt ({}), starting with none",
                        self.positions_path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    /// Persist the open-position set.
    pub fn save_positions(&self, positions: &[Position]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(positions)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        write_atomic(&self.positions_path, &content)
    }

    /// Append one record to the trade log.
    pub fn append_trade(&self, trade: &ClosedTrade) -> Result<(), StoreError> {
        let mut trades = self.load_trades();
        trades.push(trade.clone());
        let content = serde_json::to_string_pretty(&trades)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        write_atomic(&self.trades_path, &content)
    }

    /// Read the full trade log; missing or corrupt file yields an empty log.
    pub fn load_trades(&self) -> Vec<ClosedTrade> {
        fs::read_to_string(&self.trades_path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

/// Seconds between a persisted heartbeat and now (both epoch ms).
fn downtime_seconds(last_heartbeat_ms: i64, now_ms: i64) -> i64 {
    (now_ms - last_heartbeat_ms) / 1000
}

/// Write-then-rename so readers never observe a partial file.
fn write_atomic(path: &Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| StoreError::Write {
        path: tmp.display().to_string(),
        reason: e.to_string(),
    })?;
    fs::rename(&tmp, path).map_err(|e| StoreError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CloseReason;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> StateStore {
        StateStore::new(&PathsSection {
            state_file: dir.join("bot-state.json").display().to_string(),
            positions_file: dir.join("positions.json").display().to_string(),
            trades_file: dir.join("trades.json").display().to_string(),
        })
    }

    fn open_position(id: u64, token: &str) -> Position {
        Position::open(
            id,
            token.to_string(),
            "TEST".to_string(),
            1.0,
            50.0,
            15.0,
            30.0,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_fresh_state_is_persisted_immediately() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let state = store.load_state(500.0);
        assert_eq!(state.portfolio_value, 500.0);
        // The default was written out so the next load sees the same state.
        assert!(dir.path().join("bot-state.json").exists());
    }

    #[test]
    fn test_corrupt_state_falls_back_to_default() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bot-state.json"), "{ not json").unwrap();

        let store = store_in(dir.path());
        let state = store.load_state(500.0);
        assert_eq!(state.portfolio_value, 500.0);
        assert_eq!(state.total_pnl, 0.0);
    }

    #[test]
    fn test_save_stamps_heartbeat() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = PortfolioState::new(500.0);
        assert!(state.last_heartbeat.is_none());
        store.save_state(&mut state).unwrap();
        assert!(state.last_heartbeat.is_some());
    }

    #[test]
    fn test_state_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = PortfolioState::new(500.0);
        state.apply_close(-7.5);
        state.record_entry();
        store.save_state(&mut state).unwrap();

        let loaded = store.load_state(500.0);
        assert_eq!(loaded.total_pnl, state.total_pnl);
        assert_eq!(loaded.portfolio_value, state.portfolio_value);
        assert_eq!(loaded.daily_stats.trades, 1);
        assert_eq!(loaded.daily_stats.date, state.daily_stats.date);
    }

    #[test]
    fn test_positions_roundtrip() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let positions = vec![open_position(1, "mintA"), open_position(2, "mintB")];
        store.save_positions(&positions).unwrap();

        let loaded = store.load_positions();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].token, "mintA");
        assert_eq!(loaded[1].id, 2);
        assert_eq!(loaded[0].stop_loss, positions[0].stop_loss);
    }

    #[test]
    fn test_missing_positions_file_is_empty_set() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.load_positions().is_empty());
    }

    #[test]
    fn test_trade_log_appends() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let t1 = open_position(1, "mintA").into_closed(0.85, Utc::now(), CloseReason::StopLoss);
        let t2 = open_position(2, "mintB").into_closed(1.30, Utc::now(), CloseReason::TakeProfit);
        store.append_trade(&t1).unwrap();
        store.append_trade(&t2).unwrap();

        let trades = store.load_trades();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].reason, CloseReason::StopLoss);
        assert_eq!(trades[1].reason, CloseReason::TakeProfit);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut state = PortfolioState::new(500.0);
        store.save_state(&mut state).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_downtime_calculation() {
        let now = 1_700_000_120_000;
        assert_eq!(downtime_seconds(1_700_000_000_000, now), 120);
        assert_eq!(downtime_seconds(now, now), 0);
    }
}
