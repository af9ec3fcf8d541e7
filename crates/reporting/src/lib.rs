//! Attribution-aware booking analytics for chat conversations — traffic
//! source classification, funnel aggregation, ranked insights and reports.

pub mod aggregate;
pub mod attribution;
pub mod filter;
pub mod insights;
pub mod labels;
pub mod report;

pub use aggregate::{aggregate, Aggregator, RawCounters};
pub use attribution::{classify, Classification, ClickIdPlatform, TrafficClass};
pub use filter::{DateRange, QuickView, RecordFilter};
pub use insights::{summarize, summarize_with, MetricsSummary};
pub use report::render_markdown;

use chat_core::types::ChatRecord;

/// Aggregate and summarize a batch in one call.
pub fn analyze<'a, I>(records: I) -> MetricsSummary
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    summarize(&aggregate(records))
}
