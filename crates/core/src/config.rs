use serde::Deserialize;

use crate::error::{InsightsError, InsightsResult};

/// Root configuration. Loaded from environment variables with the prefix
/// `CHAT_INSIGHTS__`, e.g. `CHAT_INSIGHTS__LIMITS__TOP_SOURCES=20`.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    #[serde(default)]
    pub limits: RankingLimits,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Truncation applied to every ranked list in the summary.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RankingLimits {
    #[serde(default = "default_top_sources")]
    pub top_sources: usize,
    #[serde(default = "default_top_referrers")]
    pub top_referrers: usize,
    #[serde(default = "default_top_campaigns")]
    pub top_campaigns: usize,
    #[serde(default = "default_top_reasons")]
    pub top_reasons: usize,
    /// Job types shown by presentation layers; the summary itself keeps the full list.
    #[serde(default = "default_job_type_display")]
    pub job_type_display: usize,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(InsightsError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_top_sources() -> usize {
    10
}
fn default_top_referrers() -> usize {
    10
}
fn default_top_campaigns() -> usize {
    5
}
fn default_top_reasons() -> usize {
    5
}
fn default_job_type_display() -> usize {
    6
}
fn default_pretty() -> bool {
    true
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self {
            top_sources: default_top_sources(),
            top_referrers: default_top_referrers(),
            top_campaigns: default_top_campaigns(),
            top_reasons: default_top_reasons(),
            job_type_display: default_job_type_display(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: default_pretty(),
        }
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            limits: RankingLimits::default(),
            output: OutputConfig::default(),
        }
    }
}

impl InsightsConfig {
    /// Load configuration from environment variables.
    pub fn load() -> InsightsResult<Self> {
        Self::from_source(
            config::Environment::with_prefix("CHAT_INSIGHTS")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_source<S>(source: S) -> InsightsResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder().add_source(source).build()?;
        Ok(config.try_deserialize()?)
    }
}
