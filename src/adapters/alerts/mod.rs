//! Alert delivery adapters.

mod webhook;

pub use webhook::WebhookAlerts;
