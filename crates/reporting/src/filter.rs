//! Record selection applied before aggregation: location, date window,
//! quick views and raw attribution source.

use std::collections::BTreeSet;

use chat_core::error::{InsightsError, InsightsResult};
use chat_core::types::ChatRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Preset views over the chat log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuickView {
    #[default]
    All,
    Booked,
    /// Bookable chats that never turned into a job.
    RevenueOpportunities,
    Incomplete,
}

impl QuickView {
    pub fn matches(self, record: &ChatRecord) -> bool {
        match self {
            QuickView::All => true,
            QuickView::Booked => record.is_booked(),
            QuickView::RevenueOpportunities => record.is_revenue_opportunity(),
            QuickView::Incomplete => record.is_incomplete(),
        }
    }
}

impl std::str::FromStr for QuickView {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(QuickView::All),
            "booked" => Ok(QuickView::Booked),
            "revenue-opportunities" => Ok(QuickView::RevenueOpportunities),
            "incomplete" => Ok(QuickView::Incomplete),
            other => Err(InsightsError::Config(format!("unknown view: {other}"))),
        }
    }
}

/// Inclusive calendar-day window, evaluated in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> InsightsResult<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(InsightsError::InvalidDateRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Records without a readable timestamp fall outside any bounded range.
    pub fn contains(&self, time_stamp: Option<&str>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = time_stamp.and_then(parse_timestamp).map(|t| t.date_naive()) else {
            return false;
        };
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}

/// Accepts RFC 3339 plus the space-separated forms the record store emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    s2f_id: Option<String>,
    date_range: Option<DateRange>,
    view: QuickView,
    attribution_source: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_location(mut self, s2f_id: impl Into<String>) -> Self {
        self.s2f_id = Some(s2f_id.into());
        self
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn view(mut self, view: QuickView) -> Self {
        self.view = view;
        self
    }

    /// Keep records whose raw `utm_source` equals `source`.
    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.attribution_source = Some(source.into());
        self
    }

    pub fn matches(&self, record: &ChatRecord) -> bool {
        if let Some(ref s2f_id) = self.s2f_id {
            if &record.s2f_id != s2f_id {
                return false;
            }
        }
        if let Some(ref range) = self.date_range {
            if !range.contains(record.time_stamp.as_deref()) {
                return false;
            }
        }
        if let Some(ref source) = self.attribution_source {
            if record.utm_source() != Some(source.as_str()) {
                return false;
            }
        }
        self.view.matches(record)
    }

    pub fn apply<'a>(&self, records: &'a [ChatRecord]) -> Vec<&'a ChatRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted, de-duplicated raw `utm_source` values.
pub fn available_sources<'a, I>(records: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a ChatRecord>,
{
    records
        .into_iter()
        .filter_map(ChatRecord::utm_source)
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
