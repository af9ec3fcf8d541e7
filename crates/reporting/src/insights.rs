//! Funnel and insight calculation — derives rates, rankings and segment
//! splits from the counters of one aggregation pass.

use chat_core::config::RankingLimits;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::aggregate::{percentage, FunnelCounter, KeyedCounters, RawCounters};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSourceStat {
    pub source: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub is_paid: bool,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStat {
    pub campaign: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerStat {
    pub domain: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickIdStat {
    pub platform: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeStat {
    pub job_type: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStat {
    pub channel: String,
    pub count: u64,
    pub bookable: u64,
    pub booked: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

/// Metrics for one batch of chats. Field names are the contract consumed by
/// presentation layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    // Funnel
    pub total_chats: u64,
    pub bookable_chats: u64,
    pub booked_chats: u64,
    pub bookable_rate: f64,
    pub booking_rate: f64,
    /// Same figure as `booking_rate`: booked among bookable.
    pub conversion_rate: f64,
    /// Bookable but not booked. Negative only for inconsistent input.
    pub revenue_opportunities: i64,
    pub avg_duration_seconds: f64,

    // Attribution
    pub top_traffic_sources: Vec<TrafficSourceStat>,
    pub top_campaigns: Vec<CampaignStat>,
    pub top_referrers: Vec<ReferrerStat>,
    pub click_id_breakdown: Vec<ClickIdStat>,
    pub direct_traffic: u64,
    pub organic_traffic: u64,
    pub paid_traffic: u64,

    // Segments
    pub job_type_breakdown: Vec<JobTypeStat>,
    pub channel_breakdown: Vec<ChannelStat>,
    pub existing_customers: u64,
    pub new_customers: u64,

    // Quality
    pub incomplete_conversations: u64,
    pub top_not_booked_reasons: Vec<ReasonCount>,
    pub missing_web_session: u64,
}

impl MetricsSummary {
    /// Share of the batch, as a percentage.
    pub fn share(&self, count: u64) -> f64 {
        percentage(count, self.total_chats)
    }

    /// Leading job types, as many as a dashboard shows.
    pub fn top_job_types(&self, limits: &RankingLimits) -> &[JobTypeStat] {
        let end = limits.job_type_display.min(self.job_type_breakdown.len());
        &self.job_type_breakdown[..end]
    }
}

/// Summarize with the default ranking limits.
pub fn summarize(counters: &RawCounters) -> MetricsSummary {
    summarize_with(counters, &RankingLimits::default())
}

pub fn summarize_with(counters: &RawCounters, limits: &RankingLimits) -> MetricsSummary {
    let revenue_opportunities = counters.bookable_chats as i64 - counters.booked_chats as i64;
    if revenue_opportunities < 0 {
        warn!(
            bookable = counters.bookable_chats,
            booked = counters.booked_chats,
            "More booked than bookable chats; bookable flags are inconsistent"
        );
    }
    let booking_rate = percentage(counters.booked_chats, counters.bookable_chats);

    let mut sources: Vec<_> = counters
        .sources
        .iter()
        .map(|(source, stats)| TrafficSourceStat {
            source: source.to_string(),
            count: stats.funnel.total,
            bookable: stats.funnel.bookable,
            booked: stats.funnel.booked,
            is_paid: stats.is_paid,
            conversion_rate: stats.funnel.conversion_rate(),
        })
        .collect();
    sources.sort_by(|a, b| b.count.cmp(&a.count));
    sources.truncate(limits.top_sources);

    let top_campaigns = ranked(&counters.campaigns, Some(limits.top_campaigns))
        .map(|(campaign, stats)| CampaignStat {
            campaign,
            count: stats.total,
            bookable: stats.bookable,
            booked: stats.booked,
            conversion_rate: stats.conversion_rate(),
        })
        .collect();

    let top_referrers = ranked(&counters.referrers, Some(limits.top_referrers))
        .map(|(domain, stats)| ReferrerStat {
            domain,
            count: stats.total,
            bookable: stats.bookable,
            booked: stats.booked,
            conversion_rate: stats.conversion_rate(),
        })
        .collect();

    // Platforms stay in first-seen order.
    let click_id_breakdown = counters
        .click_ids
        .iter()
        .map(|(platform, stats)| ClickIdStat {
            platform: platform.to_string(),
            count: stats.total,
            bookable: stats.bookable,
            booked: stats.booked,
            conversion_rate: stats.conversion_rate(),
        })
        .collect();

    let job_type_breakdown = ranked(&counters.job_types, None)
        .map(|(job_type, stats)| JobTypeStat {
            job_type,
            count: stats.total,
            bookable: stats.bookable,
            booked: stats.booked,
            conversion_rate: stats.conversion_rate(),
        })
        .collect();

    let channel_breakdown = ranked(&counters.channels, None)
        .map(|(channel, stats)| ChannelStat {
            channel,
            count: stats.total,
            bookable: stats.bookable,
            booked: stats.booked,
            conversion_rate: stats.conversion_rate(),
        })
        .collect();

    let mut reasons: Vec<_> = counters
        .not_booked_reasons
        .iter()
        .map(|(reason, &count)| ReasonCount {
            reason: reason.to_string(),
            count,
        })
        .collect();
    reasons.sort_by(|a, b| b.count.cmp(&a.count));
    reasons.truncate(limits.top_reasons);

    MetricsSummary {
        total_chats: counters.total_chats,
        bookable_chats: counters.bookable_chats,
        booked_chats: counters.booked_chats,
        bookable_rate: percentage(counters.bookable_chats, counters.total_chats),
        booking_rate,
        conversion_rate: booking_rate,
        revenue_opportunities,
        avg_duration_seconds: counters.avg_duration_seconds(),
        top_traffic_sources: sources,
        top_campaigns,
        top_referrers,
        click_id_breakdown,
        direct_traffic: counters.direct_traffic,
        organic_traffic: counters.organic_traffic,
        paid_traffic: counters.paid_traffic,
        job_type_breakdown,
        channel_breakdown,
        existing_customers: counters.existing_customers,
        new_customers: counters.new_customers(),
        incomplete_conversations: counters.incomplete_conversations,
        top_not_booked_reasons: reasons,
        missing_web_session: counters.missing_web_session,
    }
}

/// Buckets by descending total; ties keep first-seen order (stable sort).
fn ranked(
    counters: &KeyedCounters<FunnelCounter>,
    limit: Option<usize>,
) -> impl Iterator<Item = (String, FunnelCounter)> {
    let mut entries: Vec<_> = counters
        .iter()
        .map(|(key, stats)| (key.to_string(), *stats))
        .collect();
    entries.sort_by(|a, b| b.1.total.cmp(&a.1.total));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries.into_iter()
}
