//! Display names for source keys, job types, channels and durations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceLabel {
    pub name: String,
    /// Domain used to look up a logo; empty when unknown.
    pub domain: String,
    pub is_paid: bool,
}

impl SourceLabel {
    fn known(name: &str, domain: &str, is_paid: bool) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            is_paid,
        }
    }
}

/// Human-readable label for a traffic source key.
///
/// `is_paid` here is the platform's nature; the summary's own paid flag comes
/// from campaign presence and is what reports should badge.
pub fn source_label(source: &str) -> SourceLabel {
    if source.is_empty() {
        return SourceLabel::known("Unknown", "", false);
    }
    let lower = source.to_lowercase();
    match lower.as_str() {
        "google-paid" => return SourceLabel::known("Google Ads", "google.com", true),
        "google-organic" => return SourceLabel::known("Google Organic", "google.com", false),
        "gmb" | "google my business" => {
            return SourceLabel::known("Business Profile", "google.com", false)
        }
        _ => {}
    }
    if lower.contains("gmblisting") || lower.contains("google business listing") {
        SourceLabel::known("Business Listing", "google.com", false)
    } else if lower == "google" || lower.contains("google.com") {
        SourceLabel::known("Google", "google.com", false)
    } else if lower == "adwords" || lower == "google ads" || lower.contains("googleads") {
        SourceLabel::known("Google Ads", "google.com", true)
    } else if lower == "bing" || lower.contains("bing.com") {
        SourceLabel::known("Bing Ads", "bing.com", true)
    } else if lower == "yahoo" || lower.contains("yahoo.com") {
        SourceLabel::known("Yahoo Ads", "yahoo.com", true)
    } else if lower.contains("precisiondoor") || lower.contains("precision-door") {
        SourceLabel::known("Precision Door", "precisiondoor.com", false)
    } else if lower == "facebook" || lower.contains("facebook.com") || lower.contains("fb") {
        SourceLabel::known("Facebook Ads", "facebook.com", true)
    } else if lower == "instagram" || lower.contains("instagram.com") || lower.contains("ig") {
        SourceLabel::known("Instagram Ads", "instagram.com", true)
    } else if lower.contains("youtube") {
        SourceLabel::known("YouTube Ads", "youtube.com", true)
    } else if lower == "chatgpt" || lower.contains("openai") {
        SourceLabel::known("ChatGPT", "openai.com", false)
    } else {
        SourceLabel {
            name: capitalize(source),
            domain: lower,
            is_paid: false,
        }
    }
}

/// `"garage-door-repair"` -> `"Garage Door Repair"`.
pub fn job_type_label(job_type: &str) -> String {
    job_type
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn channel_label(channel: &str) -> &str {
    match channel {
        "Webchat" => "Web",
        other => other,
    }
}

/// Whole seconds as `m:ss`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels() {
        assert_eq!(source_label("google-paid").name, "Google Ads");
        assert!(source_label("google-paid").is_paid);
        assert_eq!(source_label("google-organic").name, "Google Organic");
        assert_eq!(source_label("precision-door").domain, "precisiondoor.com");
        assert_eq!(source_label("yahoo").name, "Yahoo Ads");
        assert_eq!(source_label("").name, "Unknown");
    }

    #[test]
    fn test_unknown_source_passes_through_capitalized() {
        let label = source_label("nextdoor");
        assert_eq!(label.name, "Nextdoor");
        assert_eq!(label.domain, "nextdoor");
        assert!(!label.is_paid);
    }

    #[test]
    fn test_job_type_label() {
        assert_eq!(job_type_label("garage-door-repair"), "Garage Door Repair");
        assert_eq!(job_type_label("OPENER"), "Opener");
        assert_eq!(job_type_label(""), "");
    }

    #[test]
    fn test_channel_and_duration() {
        assert_eq!(channel_label("Webchat"), "Web");
        assert_eq!(channel_label("SMS"), "SMS");
        assert_eq!(format_duration(125.7), "2:05");
        assert_eq!(format_duration(0.0), "0:00");
    }
}
