pub mod config;
pub mod error;
pub mod types;

pub use config::{InsightsConfig, OutputFormat, RankingLimits};
pub use error::{InsightsError, InsightsResult};
pub use types::{BookableStatus, ChatRecord, RecordBatch, SessionAttribution, UtmParams, WebSession};
