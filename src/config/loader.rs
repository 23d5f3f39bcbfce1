//! Configuration Loader
//!
//! Loads configuration from environment variables (a `.env` file is read by
//! the binary before this runs). Every option has a documented default so the
//! bot starts with an empty environment. Configuration is immutable for the
//! process lifetime.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Main configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub trading: TradingSection,
    pub intervals: IntervalsSection,
    pub paths: PathsSection,
    pub solana: SolanaSection,
    pub alerts: AlertsSection,
}

/// Capital and risk limits.
#[derive(Debug, Clone)]
pub struct TradingSection {
    /// Starting capital in USDC (`STARTING_CAPITAL`, default 500)
    pub starting_capital: f64,
    /// Maximum size of a single position in USDC (`MAX_POSITION_SIZE`, default 50)
    pub max_position_size: f64,
    /// Maximum concurrent open positions (`MAX_POSITIONS`, default 3)
    pub max_positions: usize,
    /// Stop-loss percent below entry (`STOP_LOSS_PERCENT`, default 15)
    pub stop_loss_pct: f64,
    /// Take-profit percent above entry (`TAKE_PROFIT_PERCENT`, default 30)
    pub take_profit_pct: f64,
    /// Portfolio drawdown percent that halts trading (`PORTFOLIO_STOP_LOSS`, default 20)
    pub portfolio_stop_loss_pct: f64,
    /// Minimum 24h volume in USD for a token to be scanned (`MIN_LIQUIDITY`, default 100000)
    pub min_liquidity: f64,
    /// Minimum momentum score for an opportunity (`MOMENTUM_THRESHOLD`, default 5.0)
    pub momentum_threshold: f64,
    /// Maximum trades per calendar day (`MAX_DAILY_TRADES`, default 10)
    pub max_daily_trades: u32,
    /// Master switch for live execution (`ENABLE_TRADING`, default false)
    pub trading_enabled: bool,
    /// Compute and log decisions without swapping (`DRY_RUN`, default true)
    pub dry_run: bool,
}

/// Scheduler periods.
#[derive(Debug, Clone)]
pub struct IntervalsSection {
    /// Market scan period in seconds (`SCAN_INTERVAL_SECS`, default 30)
    pub scan_secs: u64,
    /// Position check period in seconds (`CHECK_INTERVAL_SECS`, default 10)
    pub check_secs: u64,
    /// Heartbeat period in seconds (`HEARTBEAT_INTERVAL_SECS`, default 300)
    pub heartbeat_secs: u64,
}

impl IntervalsSection {
    pub fn scan(&self) -> Duration {
        Duration::from_secs(self.scan_secs)
    }

    pub fn check(&self) -> Duration {
        Duration::from_secs(self.check_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// Persisted store locations.
#[derive(Debug, Clone)]
pub struct PathsSection {
    /// Aggregate bot state (`STATE_FILE_PATH`, default ./data/bot-state.json)
    pub state_file: String,
    /// Open positions (`POSITIONS_FILE_PATH`, default ./data/positions.json)
    pub positions_file: String,
    /// Append-only trade log (`TRADES_FILE_PATH`, default ./data/trades.json)
    pub trades_file: String,
}

/// Solana RPC and wallet settings.
#[derive(Debug, Clone)]
pub struct SolanaSection {
    /// RPC endpoint (`SOLANA_RPC_URL`, default mainnet-beta)
    pub rpc_url: String,
    /// Wallet file path (`SOLANA_KEYPAIR_PATH`, default ./wallet.json)
    pub keypair_path: String,
    /// Base64-encoded secret key, takes precedence over the file (`SOLANA_PRIVATE_KEY`)
    pub private_key: Option<String>,
}

/// Notification channels, all optional.
#[derive(Debug, Clone, Default)]
pub struct AlertsSection {
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`)
    pub telegram_bot_token: Option<String>,
    /// Telegram chat to notify (`TELEGRAM_CHAT_ID`)
    pub telegram_chat_id: Option<String>,
    /// Discord webhook URL (`DISCORD_WEBHOOK_URL`)
    pub discord_webhook_url: Option<String>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse {key}={value}: {reason}")]
    ParseError {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

fn var_parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
            key,
            value: raw,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn var_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn var_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn var_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::ParseError {
                key,
                value: raw,
                reason: "expected true/false".to_string(),
            }),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Assemble configuration from the environment and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let trading = TradingSection {
            starting_capital: var_parsed("STARTING_CAPITAL", 500.0)?,
            max_position_size: var_parsed("MAX_POSITION_SIZE", 50.0)?,
            max_positions: var_parsed("MAX_POSITIONS", 3)?,
            stop_loss_pct: var_parsed("STOP_LOSS_PERCENT", 15.0)?,
            take_profit_pct: var_parsed("TAKE_PROFIT_PERCENT", 30.0)?,
            portfolio_stop_loss_pct: var_parsed("PORTFOLIO_STOP_LOSS", 20.0)?,
            min_liquidity: var_parsed("MIN_LIQUIDITY", 100_000.0)?,
            momentum_threshold: var_parsed("MOMENTUM_THRESHOLD", 5.0)?,
            max_daily_trades: var_parsed("MAX_DAILY_TRADES", 10)?,
            trading_enabled: var_bool("ENABLE_TRADING", false)?,
            dry_run: var_bool("DRY_RUN", true)?,
        };

        let intervals = IntervalsSection {
            scan_secs: var_parsed("SCAN_INTERVAL_SECS", 30)?,
            check_secs: var_parsed("CHECK_INTERVAL_SECS", 10)?,
            heartbeat_secs: var_parsed("HEARTBEAT_INTERVAL_SECS", 300)?,
        };

        let paths = PathsSection {
            state_file: var_string("STATE_FILE_PATH", "./data/bot-state.json"),
            positions_file: var_string("POSITIONS_FILE_PATH", "./data/positions.json"),
            trades_file: var_string("TRADES_FILE_PATH", "./data/trades.json"),
        };

        let solana = SolanaSection {
            rpc_url: var_string("SOLANA_RPC_URL", "https://api.mainnet-beta.solana.com"),
            keypair_path: var_string("SOLANA_KEYPAIR_PATH", "./wallet.json"),
            private_key: var_optional("SOLANA_PRIVATE_KEY"),
        };

        let alerts = AlertsSection {
            telegram_bot_token: var_optional("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: var_optional("TELEGRAM_CHAT_ID"),
            discord_webhook_url: var_optional("DISCORD_WEBHOOK_URL"),
        };

        let config = Self {
            trading,
            intervals,
            paths,
            solana,
            alerts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.trading;

        if t.starting_capital <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "STARTING_CAPITAL must be > 0, got {}",
                t.starting_capital
            )));
        }
        if t.max_position_size <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "MAX_POSITION_SIZE must be > 0, got {}",
                t.max_position_size
            )));
        }
        if t.max_positions == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_POSITIONS must be > 0".to_string(),
            ));
        }
        if t.stop_loss_pct <= 0.0 || t.stop_loss_pct >= 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "STOP_LOSS_PERCENT must be in (0, 100), got {}",
                t.stop_loss_pct
            )));
        }
        if t.take_profit_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "TAKE_PROFIT_PERCENT must be > 0, got {}",
                t.take_profit_pct
            )));
        }
        if t.portfolio_stop_loss_pct <= 0.0 || t.portfolio_stop_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "PORTFOLIO_STOP_LOSS must be in (0, 100], got {}",
                t.portfolio_stop_loss_pct
            )));
        }
        if t.min_liquidity < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "MIN_LIQUIDITY must be >= 0, got {}",
                t.min_liquidity
            )));
        }

        let i = &self.intervals;
        if i.scan_secs == 0 || i.check_secs == 0 || i.heartbeat_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interval durations must be > 0 seconds".to_string(),
            ));
        }

        Ok(())
    }
}
