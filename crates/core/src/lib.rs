//! Shared types, configuration, and errors for campaign performance reporting.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use types::{AggregateMetrics, Cap, Record};
