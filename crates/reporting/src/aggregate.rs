//! Single-pass aggregation of chat records into keyed funnel counters.

use std::collections::HashMap;

use chat_core::types::{present, ChatRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::attribution::{classify, referrer_domain, ClickIdPlatform, TrafficClass};

/// Total / bookable / booked tallies for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelCounter {
    pub total: u64,
    pub bookable: u64,
    pub booked: u64,
}

impl FunnelCounter {
    fn record(&mut self, bookable: bool, booked: bool) {
        self.total += 1;
        if bookable {
            self.bookable += 1;
        }
        if booked {
            self.booked += 1;
        }
    }

    /// Booked among bookable, as a percentage.
    pub fn conversion_rate(&self) -> f64 {
        percentage(self.booked, self.bookable)
    }
}

/// Source bucket, flagged paid or organic by the last record folded into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceCounter {
    pub funnel: FunnelCounter,
    pub is_paid: bool,
}

/// `numerator / denominator * 100`, or 0 for an empty denominator.
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64 * 100.0
    } else {
        0.0
    }
}

/// Counters keyed by string, iterated in first-seen order.
#[derive(Debug, Clone)]
pub struct KeyedCounters<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for KeyedCounters<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V: Default> KeyedCounters<V> {
    pub fn entry_mut(&mut self, key: &str) -> &mut V {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.entries.push((key.to_string(), V::default()));
                let position = self.entries.len() - 1;
                self.index.insert(key.to_string(), position);
                position
            }
        };
        &mut self.entries[position].1
    }
}

impl<V> KeyedCounters<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything accumulated over one batch. Rates are derived later.
#[derive(Debug, Clone, Default)]
pub struct RawCounters {
    pub total_chats: u64,
    pub bookable_chats: u64,
    pub booked_chats: u64,
    pub direct_traffic: u64,
    pub organic_traffic: u64,
    pub paid_traffic: u64,
    pub existing_customers: u64,
    pub incomplete_conversations: u64,
    pub missing_web_session: u64,
    pub duration_sum: f64,
    pub duration_count: u64,
    pub sources: KeyedCounters<SourceCounter>,
    pub campaigns: KeyedCounters<FunnelCounter>,
    pub referrers: KeyedCounters<FunnelCounter>,
    pub click_ids: KeyedCounters<FunnelCounter>,
    pub job_types: KeyedCounters<FunnelCounter>,
    pub channels: KeyedCounters<FunnelCounter>,
    pub not_booked_reasons: KeyedCounters<u64>,
}

impl RawCounters {
    pub fn new_customers(&self) -> u64 {
        self.total_chats - self.existing_customers
    }

    /// Mean over records that carry a duration; absent durations are not zeros.
    pub fn avg_duration_seconds(&self) -> f64 {
        if self.duration_count > 0 {
            self.duration_sum / self.duration_count as f64
        } else {
            0.0
        }
    }
}

/// Folds records into [`RawCounters`] one at a time.
#[derive(Debug, Default)]
pub struct Aggregator {
    counters: RawCounters,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_all<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a ChatRecord>,
    {
        for record in records {
            self.observe(record);
        }
    }

    pub fn observe(&mut self, record: &ChatRecord) {
        let c = &mut self.counters;
        let bookable = record.is_bookable();
        let booked = record.is_booked();

        c.total_chats += 1;
        if bookable {
            c.bookable_chats += 1;
        }
        if booked {
            c.booked_chats += 1;
        }
        if record.is_existing_customer() {
            c.existing_customers += 1;
        }
        if record.is_incomplete() {
            c.incomplete_conversations += 1;
        }
        if let Some(duration) = record.duration {
            c.duration_sum += duration;
            c.duration_count += 1;
        }
        if let Some(reason) = present(&record.not_booked_reasons) {
            *c.not_booked_reasons.entry_mut(reason) += 1;
        }

        c.job_types
            .entry_mut(record.job_type_label())
            .record(bookable, booked);
        c.channels
            .entry_mut(record.channel_label())
            .record(bookable, booked);

        let session = record.web_session.as_ref();
        if session.is_none() {
            c.missing_web_session += 1;
        }

        let classification = classify(session);
        match classification.traffic_class() {
            TrafficClass::Direct => c.direct_traffic += 1,
            TrafficClass::Organic => c.organic_traffic += 1,
            TrafficClass::Paid => c.paid_traffic += 1,
        }
        if let Some(key) = classification.source_key.as_deref() {
            let source = c.sources.entry_mut(key);
            source.funnel.record(bookable, booked);
            source.is_paid = classification.is_paid;
        }

        let Some(session) = session else {
            return;
        };

        if let Some(campaign) = session.utm_campaign() {
            c.campaigns.entry_mut(campaign).record(bookable, booked);
        }

        if let Some(referrer) = session.referrer() {
            match referrer_domain(referrer) {
                Some(domain) => c.referrers.entry_mut(&domain).record(bookable, booked),
                None => trace!(record_id = record.id, referrer, "Referrer skipped"),
            }
        }

        for platform in ClickIdPlatform::detect(Some(session)) {
            c.click_ids
                .entry_mut(platform.display_name())
                .record(bookable, booked);
        }
    }

    pub fn finish(self) -> RawCounters {
        let c = &self.counters;
        debug!(
            total = c.total_chats,
            bookable = c.bookable_chats,
            booked = c.booked_chats,
            direct = c.direct_traffic,
            organic = c.organic_traffic,
            paid = c.paid_traffic,
            sources = c.sources.len(),
            referrers = c.referrers.len(),
            "Aggregation pass complete"
        );
        self.counters
    }
}

/// Aggregate a whole batch in one pass.
pub fn aggregate<'a, I>(records: I) -> RawCounters
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    let mut aggregator = Aggregator::new();
    aggregator.observe_all(records);
    aggregator.finish()
}
