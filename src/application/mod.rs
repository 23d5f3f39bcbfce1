//! Application layer: the scanner, the position manager, and the engine that
//! schedules them.

pub mod engine;
pub mod manager;
pub mod scanner;

pub use engine::{EngineError, TradingEngine};
pub use manager::PositionManager;
pub use scanner::{Opportunity, OpportunityScanner};
