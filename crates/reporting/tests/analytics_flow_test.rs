//! End-to-end flow: store export -> selection -> aggregation -> summary -> report.

use chat_core::types::RecordBatch;
use chat_reporting::filter::{DateRange, RecordFilter};
use chat_reporting::{aggregate, analyze, render_markdown, summarize};
use chrono::{NaiveDate, Utc};

fn load() -> RecordBatch {
    RecordBatch::from_json_str(include_str!("fixtures/response.json")).unwrap()
}

#[test]
fn test_full_batch_funnel() {
    let batch = load();
    let summary = analyze(&batch.list);

    assert_eq!(summary.total_chats, 5);
    assert_eq!(summary.bookable_chats, 3);
    assert_eq!(summary.booked_chats, 2);
    assert!((summary.booking_rate - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(summary.bookable_rate, 60.0);
    assert_eq!(summary.revenue_opportunities, 1);
    assert_eq!(summary.incomplete_conversations, 1);
    // 240 + 120 + 60 + 300 over four recorded durations
    assert_eq!(summary.avg_duration_seconds, 180.0);
    assert!(summary.booked_chats <= summary.total_chats);
    assert!(summary.bookable_chats <= summary.total_chats);
}

#[test]
fn test_segments_cover_every_chat() {
    let summary = analyze(&load().list);
    assert_eq!(summary.new_customers + summary.existing_customers, summary.total_chats);
    let channel_total: u64 = summary.channel_breakdown.iter().map(|c| c.count).sum();
    assert_eq!(channel_total, summary.total_chats);
    assert_eq!(summary.channel_breakdown[0].channel, "Webchat");
    assert_eq!(summary.channel_breakdown[0].count, 3);
    assert_eq!(
        summary.direct_traffic + summary.organic_traffic + summary.paid_traffic,
        summary.total_chats
    );
}

#[test]
fn test_attribution_resolution() {
    let summary = analyze(&load().list);
    let source = |key: &str| summary.top_traffic_sources.iter().find(|s| s.source == key);

    let paid = source("google-paid").expect("google with campaign is paid");
    assert!(paid.is_paid);
    assert_eq!(paid.booked, 1);
    assert!(source("google").is_none());

    // Yahoo referrer wins over utm_source=bing
    assert!(source("yahoo").is_some());
    assert!(source("bing").is_none());

    assert!(!source("google-organic").unwrap().is_paid);

    // No session (Id 4) and no source (Id 5) are direct
    assert_eq!(summary.direct_traffic, 2);
    assert_eq!(summary.paid_traffic, 1);
    assert_eq!(summary.missing_web_session, 1);
}

#[test]
fn test_click_ids_and_referrers() {
    let summary = analyze(&load().list);
    let platforms: Vec<_> = summary.click_id_breakdown.iter().map(|c| c.platform.as_str()).collect();
    assert_eq!(platforms, vec!["Google Ads", "Facebook Ads"]);

    let domains: Vec<_> = summary.top_referrers.iter().map(|r| r.domain.as_str()).collect();
    assert_eq!(domains, vec!["google.com", "search.yahoo.com"]);
    assert_eq!(summary.top_campaigns.len(), 1);
    assert_eq!(summary.top_campaigns[0].campaign, "spring-tuneup");
}

#[test]
fn test_not_booked_reasons_ranked() {
    let summary = analyze(&load().list);
    assert_eq!(summary.top_not_booked_reasons[0].reason, "Customer wanted a quote first");
    assert_eq!(summary.top_not_booked_reasons[0].count, 2);
    assert_eq!(summary.top_not_booked_reasons.len(), 2);
}

#[test]
fn test_selection_before_aggregation() {
    let batch = load();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2025, 3, 1),
        NaiveDate::from_ymd_opt(2025, 3, 31),
    )
    .unwrap();
    let selected = RecordFilter::new()
        .for_location("loc-100")
        .within(range)
        .apply(&batch.list);
    let summary = summarize(&aggregate(selected));
    assert_eq!(summary.total_chats, 4);
    assert_eq!(summary.booked_chats, 1);
}

#[test]
fn test_summary_json_is_stable_across_runs() {
    let batch = load();
    let first = serde_json::to_string(&analyze(&batch.list)).unwrap();
    let second = serde_json::to_string(&analyze(&batch.list)).unwrap();
    assert_eq!(first, second);
    assert!(!first.contains("generatedAt"));
}

#[test]
fn test_markdown_report_from_export() {
    let summary = analyze(&load().list);
    let md = render_markdown(&summary, "Chat Analysis Report", Utc::now());
    assert!(md.contains("## Top Traffic Sources"));
    assert!(md.contains("| Google Ads | Paid | 1 | 1 | 1 | 100.0% |"));
    assert!(md.contains("| Opener Install |"));
}
