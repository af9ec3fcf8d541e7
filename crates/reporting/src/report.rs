//! Markdown rendering of a [`MetricsSummary`] for sharing outside the dashboard.

use chrono::{DateTime, Utc};

use crate::insights::MetricsSummary;
use crate::labels::{channel_label, format_duration, job_type_label, source_label};

fn table(headers: &[&str], rows: Vec<Vec<String>>, empty_note: &str) -> String {
    if rows.is_empty() {
        return format!("_{empty_note}_\n");
    }
    let mut out = format!("| {} |\n", headers.join(" | "));
    out.push_str(&format!(
        "|{}|\n",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join("|")
    ));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// Render the full analysis report, stamped with `generated_at`.
pub fn render_markdown(
    summary: &MetricsSummary,
    title: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = format!("# {title}\n\n");
    md.push_str(&format!(
        "**Generated:** {}  \n**Total Records Analyzed:** {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        summary.total_chats
    ));

    md.push_str("## Key Performance Indicators\n\n");
    md.push_str(&table(
        &["Metric", "Value", "Notes"],
        vec![
            vec!["Total Chats".into(), summary.total_chats.to_string(), "100%".into()],
            vec![
                "Bookable Chats".into(),
                summary.bookable_chats.to_string(),
                pct(summary.bookable_rate),
            ],
            vec![
                "Booked Chats".into(),
                summary.booked_chats.to_string(),
                format!("{} of bookable", pct(summary.booking_rate)),
            ],
            vec![
                "Revenue Opportunities".into(),
                summary.revenue_opportunities.to_string(),
                "Bookable but not booked".into(),
            ],
            vec![
                "Avg Chat Duration".into(),
                format_duration(summary.avg_duration_seconds),
                "Minutes:Seconds".into(),
            ],
        ],
        "",
    ));

    md.push_str("\n## Traffic Split\n\n");
    md.push_str(&table(
        &["Type", "Count", "Share"],
        [
            ("Direct", summary.direct_traffic),
            ("Organic", summary.organic_traffic),
            ("Paid", summary.paid_traffic),
        ]
        .iter()
        .map(|(name, count)| vec![name.to_string(), count.to_string(), pct(summary.share(*count))])
        .collect(),
        "",
    ));

    md.push_str("\n## Top Traffic Sources\n\n");
    md.push_str(&table(
        &["Source", "Type", "Chats", "Bookable", "Booked", "Conv. Rate"],
        summary
            .top_traffic_sources
            .iter()
            .map(|s| {
                vec![
                    source_label(&s.source).name,
                    if s.is_paid { "Paid" } else { "Organic" }.to_string(),
                    s.count.to_string(),
                    s.bookable.to_string(),
                    s.booked.to_string(),
                    pct(s.conversion_rate),
                ]
            })
            .collect(),
        "No traffic source data available",
    ));

    md.push_str("\n## Top Campaigns\n\n");
    md.push_str(&table(
        &["Campaign", "Chats", "Bookable", "Booked", "Conv. Rate"],
        summary
            .top_campaigns
            .iter()
            .map(|c| {
                vec![
                    c.campaign.clone(),
                    c.count.to_string(),
                    c.bookable.to_string(),
                    c.booked.to_string(),
                    pct(c.conversion_rate),
                ]
            })
            .collect(),
        "No campaign data available",
    ));

    md.push_str("\n## Click ID Distribution\n\n");
    md.push_str(&table(
        &["Platform", "Chats", "Bookable", "Booked", "Conv. Rate"],
        summary
            .click_id_breakdown
            .iter()
            .map(|c| {
                vec![
                    c.platform.clone(),
                    c.count.to_string(),
                    c.bookable.to_string(),
                    c.booked.to_string(),
                    pct(c.conversion_rate),
                ]
            })
            .collect(),
        "No click identifiers found",
    ));

    md.push_str("\n## Top Referrers\n\n");
    md.push_str(&table(
        &["Domain", "Chats", "Bookable", "Booked", "Conv. Rate"],
        summary
            .top_referrers
            .iter()
            .map(|r| {
                vec![
                    r.domain.clone(),
                    r.count.to_string(),
                    r.bookable.to_string(),
                    r.booked.to_string(),
                    pct(r.conversion_rate),
                ]
            })
            .collect(),
        "No referrer data available",
    ));

    md.push_str("\n## Channel Performance\n\n");
    md.push_str(&table(
        &["Channel", "Chats", "Bookable", "Booked", "Conv. Rate", "Share"],
        summary
            .channel_breakdown
            .iter()
            .map(|c| {
                vec![
                    channel_label(&c.channel).to_string(),
                    c.count.to_string(),
                    c.bookable.to_string(),
                    c.booked.to_string(),
                    pct(c.conversion_rate),
                    pct(summary.share(c.count)),
                ]
            })
            .collect(),
        "No channel data available",
    ));

    md.push_str("\n## Job Type Performance\n\n");
    md.push_str(&table(
        &["Job Type", "Chats", "Bookable", "Booked", "Conv. Rate"],
        summary
            .job_type_breakdown
            .iter()
            .map(|j| {
                vec![
                    job_type_label(&j.job_type),
                    j.count.to_string(),
                    j.bookable.to_string(),
                    j.booked.to_string(),
                    format!("{:.0}%", j.conversion_rate),
                ]
            })
            .collect(),
        "No job type data available",
    ));

    md.push_str("\n## Customer Insights\n\n");
    md.push_str(&table(
        &["Type", "Count", "Share"],
        vec![
            vec![
                "New Customers".into(),
                summary.new_customers.to_string(),
                pct(summary.share(summary.new_customers)),
            ],
            vec![
                "Existing Customers".into(),
                summary.existing_customers.to_string(),
                pct(summary.share(summary.existing_customers)),
            ],
        ],
        "",
    ));

    md.push_str("\n## Quality & Data Issues\n\n");
    md.push_str(&table(
        &["Issue", "Count"],
        vec![
            vec![
                "Incomplete Conversations".into(),
                summary.incomplete_conversations.to_string(),
            ],
            vec![
                "No Web Session Data".into(),
                summary.missing_web_session.to_string(),
            ],
        ],
        "",
    ));

    md.push_str("\n### Top Not-Booked Reasons\n\n");
    md.push_str(&table(
        &["Reason", "Count"],
        summary
            .top_not_booked_reasons
            .iter()
            .map(|r| vec![r.reason.clone(), r.count.to_string()])
            .collect(),
        "No not-booked reasons recorded",
    ));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::insights::summarize;
    use chat_core::types::ChatRecord;

    #[test]
    fn test_empty_sections_render_notes() {
        let summary = summarize(&aggregate(&Vec::<ChatRecord>::new()));
        let md = render_markdown(&summary, "Chat Analysis", Utc::now());
        assert!(md.starts_with("# Chat Analysis\n"));
        assert!(md.contains("_No referrer data available_"));
        assert!(md.contains("| Direct | 0 | 0.0% |"));
    }

    #[test]
    fn test_generation_time_comes_from_caller() {
        let summary = summarize(&aggregate(&Vec::<ChatRecord>::new()));
        let at = DateTime::parse_from_rfc3339("2025-03-14T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let md = render_markdown(&summary, "Chat Analysis", at);
        assert!(md.contains("**Generated:** 2025-03-14 09:30 UTC"));
        assert_eq!(md, render_markdown(&summary, "Chat Analysis", at));
    }

    #[test]
    fn test_rows_use_display_labels() {
        let records = vec![ChatRecord {
            bookable: Some("Bookable".into()),
            job_id: Some("J1".into()),
            job_type: Some("garage-door-repair".into()),
            source: Some("Webchat".into()),
            duration: Some(185.0),
            ..Default::default()
        }];
        let md = render_markdown(&summarize(&aggregate(&records)), "Report", Utc::now());
        assert!(md.contains("| Web | 1 | 1 | 1 | 100.0% | 100.0% |"));
        assert!(md.contains("| Garage Door Repair | 1 | 1 | 1 | 100% |"));
        assert!(md.contains("| Avg Chat Duration | 3:05 |"));
    }
}
