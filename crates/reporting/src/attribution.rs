//! Attribution classification — resolves the acquisition source of a single
//! chat from its web-session signals and labels it paid, organic or direct.

use chat_core::types::{present, SessionAttribution, WebSession};
use serde::{Deserialize, Serialize};

/// Source key assigned to referrals from Yahoo search.
pub const YAHOO_SOURCE: &str = "yahoo";
/// Source key assigned to referrals from the franchise's own sites.
pub const PRECISION_DOOR_SOURCE: &str = "precision-door";
pub const GOOGLE_PAID_SOURCE: &str = "google-paid";
pub const GOOGLE_ORGANIC_SOURCE: &str = "google-organic";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrafficClass {
    Direct,
    Organic,
    Paid,
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub source_key: Option<String>,
    /// `utm_campaign` was present, whatever source resolved.
    pub is_paid: bool,
}

impl Classification {
    pub fn direct() -> Self {
        Self {
            source_key: None,
            is_paid: false,
        }
    }

    pub fn traffic_class(&self) -> TrafficClass {
        match (&self.source_key, self.is_paid) {
            (None, _) => TrafficClass::Direct,
            (Some(_), true) => TrafficClass::Paid,
            (Some(_), false) => TrafficClass::Organic,
        }
    }
}

/// Classify a record by its (optional) web session.
pub fn classify(session: Option<&WebSession>) -> Classification {
    let Some(session) = session else {
        return Classification::direct();
    };

    let is_paid = session.utm_campaign().is_some();
    let resolved: Option<&str> = match session.referrer().and_then(source_from_referrer) {
        Some(source) => Some(source),
        None => session.utm_source(),
    };

    let Some(source) = resolved else {
        return Classification {
            source_key: None,
            is_paid,
        };
    };

    let source_key = if is_google_source(source) {
        if is_paid {
            GOOGLE_PAID_SOURCE
        } else {
            GOOGLE_ORGANIC_SOURCE
        }
        .to_string()
    } else {
        source.to_string()
    };

    Classification {
        source_key: Some(source_key),
        is_paid,
    }
}

/// Referrer text that overrides whatever `utm_source` says.
///
/// The `pd` rule matches any `.com`/`.net` referrer containing those two
/// letters anywhere (`updates.com` included); kept for parity with reported
/// figures.
pub fn source_from_referrer(referrer: &str) -> Option<&'static str> {
    let lower = referrer.to_lowercase();
    if lower.contains("yahoo.com") || lower.contains("search.yahoo") {
        Some(YAHOO_SOURCE)
    } else if lower.contains("precisiondoor")
        || lower.contains("precision-door")
        || (lower.contains("pd") && (lower.contains(".com") || lower.contains(".net")))
    {
        Some(PRECISION_DOOR_SOURCE)
    } else {
        None
    }
}

/// Google variants that get split into paid and organic buckets.
pub fn is_google_source(source: &str) -> bool {
    let lower = source.to_lowercase();
    lower == "google" || lower == "gmb" || lower == "google my business" || lower.contains("gmblisting")
}

/// Host of the referrer URL with a leading `www.` removed.
pub fn referrer_domain(referrer: &str) -> Option<String> {
    if referrer.is_empty() || referrer == "direct" {
        return None;
    }
    let url = url::Url::parse(referrer).ok()?;
    let host = url.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Ad platforms identified by their click-id query parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClickIdPlatform {
    GoogleAds,
    FacebookAds,
    MicrosoftAds,
}

impl ClickIdPlatform {
    pub const ALL: [ClickIdPlatform; 3] = [
        ClickIdPlatform::GoogleAds,
        ClickIdPlatform::FacebookAds,
        ClickIdPlatform::MicrosoftAds,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ClickIdPlatform::GoogleAds => "Google Ads",
            ClickIdPlatform::FacebookAds => "Facebook Ads",
            ClickIdPlatform::MicrosoftAds => "Microsoft Ads",
        }
    }

    fn is_present(self, attribution: &SessionAttribution) -> bool {
        let id = match self {
            ClickIdPlatform::GoogleAds => &attribution.gclid,
            ClickIdPlatform::FacebookAds => &attribution.fbclid,
            ClickIdPlatform::MicrosoftAds => &attribution.msclkid,
        };
        present(id).is_some()
    }

    /// Every platform with a click id on the session. Not exclusive.
    pub fn detect(session: Option<&WebSession>) -> Vec<ClickIdPlatform> {
        let Some(attribution) = session.and_then(|s| s.attribution.as_ref()) else {
            return Vec::new();
        };
        Self::ALL
            .into_iter()
            .filter(|platform| platform.is_present(attribution))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::types::UtmParams;

    fn session(source: Option<&str>, campaign: Option<&str>, referrer: Option<&str>) -> WebSession {
        WebSession {
            attribution: Some(SessionAttribution {
                referrer: referrer.map(String::from),
                ..Default::default()
            }),
            utm: Some(UtmParams {
                utm_source: source.map(String::from),
                utm_campaign: campaign.map(String::from),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_missing_session_is_direct() {
        let c = classify(None);
        assert_eq!(c, Classification::direct());
        assert_eq!(c.traffic_class(), TrafficClass::Direct);
    }

    #[test]
    fn test_no_source_no_referrer_is_direct() {
        let c = classify(Some(&session(None, None, None)));
        assert_eq!(c.source_key, None);
        assert_eq!(c.traffic_class(), TrafficClass::Direct);
    }

    #[test]
    fn test_google_with_campaign_is_google_paid() {
        let c = classify(Some(&session(Some("Google"), Some("spring-sale"), None)));
        assert_eq!(c.source_key.as_deref(), Some(GOOGLE_PAID_SOURCE));
        assert_eq!(c.traffic_class(), TrafficClass::Paid);
    }

    #[test]
    fn test_gmb_without_campaign_is_google_organic() {
        let c = classify(Some(&session(Some("gmb"), None, None)));
        assert_eq!(c.source_key.as_deref(), Some(GOOGLE_ORGANIC_SOURCE));
        assert_eq!(c.traffic_class(), TrafficClass::Organic);

        let listing = classify(Some(&session(Some("GMBListing-north"), Some(""), None)));
        assert_eq!(listing.source_key.as_deref(), Some(GOOGLE_ORGANIC_SOURCE));
    }

    #[test]
    fn test_yahoo_referrer_overrides_utm_source() {
        let c = classify(Some(&session(
            Some("bing"),
            Some("brand"),
            Some("https://search.yahoo.com/search?p=garage+door"),
        )));
        assert_eq!(c.source_key.as_deref(), Some(YAHOO_SOURCE));
        assert!(c.is_paid);
    }

    #[test]
    fn test_pd_substring_rule_is_preserved() {
        assert_eq!(source_from_referrer("https://updates.com/"), Some(PRECISION_DOOR_SOURCE));
        assert_eq!(source_from_referrer("https://pdx-garage.net/"), Some(PRECISION_DOOR_SOURCE));
        assert_eq!(source_from_referrer("https://pdx-garage.org/"), None);
        assert_eq!(source_from_referrer("https://speedway.com/"), None);
        assert_eq!(source_from_referrer("https://PrecisionDoor.net/x"), Some(PRECISION_DOOR_SOURCE));
        assert_eq!(source_from_referrer("https://www.bing.com/"), None);
    }

    #[test]
    fn test_campaign_without_source_stays_direct() {
        let c = classify(Some(&session(None, Some("orphan"), None)));
        assert!(c.is_paid);
        assert_eq!(c.traffic_class(), TrafficClass::Direct);
    }

    #[test]
    fn test_referrer_domain() {
        assert_eq!(referrer_domain("https://www.facebook.com/l.php").as_deref(), Some("facebook.com"));
        assert_eq!(referrer_domain("https://m.facebook.com/").as_deref(), Some("m.facebook.com"));
        assert_eq!(referrer_domain("direct"), None);
        assert_eq!(referrer_domain("not a url"), None);
        assert_eq!(referrer_domain(""), None);
    }

    #[test]
    fn test_click_ids_are_not_exclusive() {
        let session = WebSession {
            attribution: Some(SessionAttribution {
                gclid: Some("g-1".into()),
                fbclid: Some("f-1".into()),
                msclkid: Some(String::new()),
                ..Default::default()
            }),
            utm: None,
        };
        assert_eq!(
            ClickIdPlatform::detect(Some(&session)),
            vec![ClickIdPlatform::GoogleAds, ClickIdPlatform::FacebookAds]
        );
        assert!(ClickIdPlatform::detect(None).is_empty());
    }
}
