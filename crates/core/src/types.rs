//! Chat interaction records as exported by the record store, with the nested
//! web-session attribution bundle captured by the chat widget.

use serde::{Deserialize, Serialize};

use crate::error::InsightsResult;

/// Canonical value of the `bookable` field for a bookable conversation.
pub const BOOKABLE: &str = "Bookable";
const NOT_BOOKABLE_PREFIX: &str = "Not Bookable - ";

/// One customer conversation handled by the booking assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "Id", default)]
    pub id: i64,
    #[serde(rename = "CreatedAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "UpdatedAt", default)]
    pub updated_at: Option<String>,
    /// Correlation id of the location the conversation belongs to.
    #[serde(rename = "s2fId", default)]
    pub s2f_id: String,
    #[serde(rename = "timeStamp", default)]
    pub time_stamp: Option<String>,
    #[serde(rename = "jobType", default)]
    pub job_type: Option<String>,
    #[serde(rename = "jobId", default)]
    pub job_id: Option<String>,
    /// Conversation length in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub bookable: Option<BookableStatus>,
    #[serde(rename = "notBookedReasons", default)]
    pub not_booked_reasons: Option<String>,
    /// Channel the conversation arrived on (SMS, Voice, Webchat).
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "existingCustomer", default)]
    pub existing_customer: Option<bool>,
    #[serde(rename = "webSession", default)]
    pub web_session: Option<WebSession>,
}

/// Attribution bundle captured by the web widget at session start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSession {
    #[serde(default)]
    pub attribution: Option<SessionAttribution>,
    #[serde(default)]
    pub utm: Option<UtmParams>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionAttribution {
    pub gclid: Option<String>,
    pub fbclid: Option<String>,
    pub msclkid: Option<String>,
    pub gbraid: Option<String>,
    pub wbraid: Option<String>,
    pub referrer: Option<String>,
    pub original_referrer: Option<String>,
    pub landing_page: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub utm_adgroup: Option<String>,
}

/// The store emits `null` and `""` interchangeably for missing values.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl WebSession {
    pub fn utm_source(&self) -> Option<&str> {
        self.utm.as_ref().and_then(|u| present(&u.utm_source))
    }

    pub fn utm_campaign(&self) -> Option<&str> {
        self.utm.as_ref().and_then(|u| present(&u.utm_campaign))
    }

    pub fn referrer(&self) -> Option<&str> {
        self.attribution.as_ref().and_then(|a| present(&a.referrer))
    }
}

impl ChatRecord {
    /// `bookable` is exactly `"Bookable"`.
    pub fn is_bookable(&self) -> bool {
        matches!(self.bookable, Some(BookableStatus::Bookable))
    }

    /// An appointment was scheduled. Independent of [`Self::is_bookable`].
    pub fn is_booked(&self) -> bool {
        present(&self.job_id).is_some()
    }

    pub fn is_incomplete(&self) -> bool {
        self.bookable
            .as_ref()
            .is_some_and(|b| b.detail().contains("Incomplete"))
    }

    /// Bookable but never booked.
    pub fn is_revenue_opportunity(&self) -> bool {
        self.is_bookable() && !self.is_booked()
    }

    pub fn is_existing_customer(&self) -> bool {
        self.existing_customer.unwrap_or(false)
    }

    pub fn job_type_label(&self) -> &str {
        present(&self.job_type).unwrap_or("Not Specified")
    }

    pub fn channel_label(&self) -> &str {
        present(&self.source).unwrap_or("Unknown")
    }

    pub fn utm_source(&self) -> Option<&str> {
        self.web_session.as_ref().and_then(WebSession::utm_source)
    }
}

/// Parsed form of the free-text `bookable` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookableStatus {
    Bookable,
    /// `"Not Bookable - <reason>"`, holding the reason.
    NotBookable(String),
    /// Any other text the store produced.
    Other(String),
}

impl BookableStatus {
    /// Reason or free text; empty for [`BookableStatus::Bookable`].
    pub fn detail(&self) -> &str {
        match self {
            BookableStatus::Bookable => "",
            BookableStatus::NotBookable(reason) | BookableStatus::Other(reason) => reason,
        }
    }

    /// Compact label for tables and badges.
    pub fn short_label(&self) -> &str {
        match self {
            BookableStatus::Bookable => BOOKABLE,
            BookableStatus::NotBookable(reason) => match reason.as_str() {
                "Incomplete Conversation" => "Incomplete",
                "Service Not Offered" | "Service Not Provided" => "No Service",
                "Outside Service Area" => "Out of Area",
                "Parts Inquiry" => "Parts Only",
                "Marketing Inquiry" => "Marketing",
                "Leave A Review" => "Review",
                "Leave A Message for Manager" => "Manager Msg",
                "Spam/Irrelevant" => "Spam",
                other => other,
            },
            BookableStatus::Other(text) => text,
        }
    }
}

impl From<String> for BookableStatus {
    fn from(raw: String) -> Self {
        if raw == BOOKABLE {
            BookableStatus::Bookable
        } else if let Some(reason) = raw.strip_prefix(NOT_BOOKABLE_PREFIX) {
            BookableStatus::NotBookable(reason.to_string())
        } else {
            BookableStatus::Other(raw)
        }
    }
}

impl From<&str> for BookableStatus {
    fn from(raw: &str) -> Self {
        BookableStatus::from(raw.to_string())
    }
}

impl From<BookableStatus> for String {
    fn from(status: BookableStatus) -> Self {
        match status {
            BookableStatus::Bookable => BOOKABLE.to_string(),
            BookableStatus::NotBookable(reason) => format!("{NOT_BOOKABLE_PREFIX}{reason}"),
            BookableStatus::Other(text) => text,
        }
    }
}

/// A batch of records as handed over by the record-store collaborator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordBatch {
    pub list: Vec<ChatRecord>,
}

/// Accepts `{"list": [...]}` (a `null` list reads as empty) or a bare array.
/// An object without a `list` key is rejected rather than read as empty.
impl<'de> Deserialize<'de> for RecordBatch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        use serde_json::Value;

        let list = match Value::deserialize(deserializer)? {
            Value::Array(items) => records_from(Value::Array(items)).map_err(D::Error::custom)?,
            Value::Object(mut envelope) => match envelope.remove("list") {
                None => return Err(D::Error::missing_field("list")),
                Some(Value::Null) => Vec::new(),
                Some(list) => records_from(list).map_err(D::Error::custom)?,
            },
            _ => {
                return Err(D::Error::custom(
                    "expected a record array or an object with a `list` key",
                ))
            }
        };
        Ok(RecordBatch { list })
    }
}

fn records_from(value: serde_json::Value) -> Result<Vec<ChatRecord>, serde_json::Error> {
    serde_json::from_value(value)
}

impl RecordBatch {
    pub fn from_json_str(json: &str) -> InsightsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> InsightsResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookable_status_parsing() {
        assert_eq!(BookableStatus::from("Bookable"), BookableStatus::Bookable);
        assert_eq!(
            BookableStatus::from("Not Bookable - Outside Service Area"),
            BookableStatus::NotBookable("Outside Service Area".into())
        );
        // Exact match only
        assert_eq!(
            BookableStatus::from("bookable"),
            BookableStatus::Other("bookable".into())
        );
    }

    #[test]
    fn test_bookable_status_roundtrips_raw_text() {
        let raw = "Not Bookable - Spam/Irrelevant";
        let status = BookableStatus::from(raw);
        assert_eq!(String::from(status.clone()), raw);
        assert_eq!(status.short_label(), "Spam");
        assert_eq!(
            BookableStatus::from("Not Bookable - Something New").short_label(),
            "Something New"
        );
    }

    #[test]
    fn test_record_predicates() {
        let record = ChatRecord {
            bookable: Some("Not Bookable - Incomplete Conversation".into()),
            job_id: Some(String::new()),
            ..Default::default()
        };
        assert!(!record.is_bookable());
        assert!(!record.is_booked());
        assert!(record.is_incomplete());
        assert_eq!(record.job_type_label(), "Not Specified");
        assert_eq!(record.channel_label(), "Unknown");

        let booked = ChatRecord {
            job_id: Some("J1".into()),
            ..Default::default()
        };
        assert!(booked.is_booked());
        assert!(!booked.is_bookable());
        assert!(!booked.is_revenue_opportunity());
    }

    #[test]
    fn test_deserialize_store_record() {
        let json = r#"{
            "Id": 7,
            "s2fId": "loc-1",
            "jobType": "garage-door-repair",
            "jobId": null,
            "duration": 95,
            "bookable": "Bookable",
            "source": "Webchat",
            "existingCustomer": false,
            "transcript": "ignored",
            "webSession": {
                "attribution": { "gclid": "abc", "referrer": "https://www.google.com/" },
                "utm": { "utm_source": "google", "utm_campaign": "" }
            }
        }"#;
        let record: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 7);
        assert!(record.is_bookable());
        assert_eq!(record.duration, Some(95.0));
        let session = record.web_session.as_ref().unwrap();
        assert_eq!(session.utm_source(), Some("google"));
        assert_eq!(session.utm_campaign(), None);
        assert_eq!(session.referrer(), Some("https://www.google.com/"));
    }

    #[test]
    fn test_batch_accepts_envelope_and_bare_array() {
        let envelope = RecordBatch::from_json_str(r#"{"list": [{"Id": 1}, {"Id": 2}]}"#).unwrap();
        assert_eq!(envelope.len(), 2);
        let bare = RecordBatch::from_json_str(r#"[{"Id": 1}]"#).unwrap();
        assert_eq!(bare.len(), 1);
        let empty = RecordBatch::from_json_str(r#"{"list": null}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_batch_rejects_envelope_without_list_key() {
        let err = RecordBatch::from_json_str(r#"{"records": [{"Id": 1}]}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `list`"), "{err}");
        assert!(RecordBatch::from_json_str("42").is_err());
    }

    #[test]
    fn test_batch_reports_bad_record_detail() {
        let err = RecordBatch::from_json_str(r#"{"list": [{"Id": "x"}]}"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"), "{err}");
        let err = RecordBatch::from_json_str(r#"[{"Id": 1}, {"Id": "x"}]"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"), "{err}");
    }
}
