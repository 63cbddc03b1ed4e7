use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const UNKNOWN_LOCATION: &str = "Unknown location";
pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_ACTIVITY: &str = "Activity";

/// Lifecycle label of a logged activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Planned,
    InProgress,
    Completed,
    Delayed,
    Cancelled,
}

impl LogStatus {
    pub const ALL: [LogStatus; 5] = [
        LogStatus::Planned,
        LogStatus::InProgress,
        LogStatus::Completed,
        LogStatus::Delayed,
        LogStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Planned => "planned",
            LogStatus::InProgress => "in_progress",
            LogStatus::Completed => "completed",
            LogStatus::Delayed => "delayed",
            LogStatus::Cancelled => "cancelled",
        }
    }

    /// Lenient parse used on AI output and table rows. Unknown labels become `Completed`.
    pub fn parse_lenient(raw: &str) -> LogStatus {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "planned" | "scheduled" | "pending" => LogStatus::Planned,
            "in_progress" | "inprogress" | "ongoing" | "active" => LogStatus::InProgress,
            "delayed" | "blocked" | "on_hold" => LogStatus::Delayed,
            "cancelled" | "canceled" => LogStatus::Cancelled,
            _ => LogStatus::Completed,
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A single structured activity record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub activity_type: String,
    pub notes: String,
    pub material: Option<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub personnel: Vec<String>,
    pub media_url: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub episode_id: Option<String>,
    pub status: LogStatus,
    pub reference_id: String,
    pub video_title: Option<String>,
}

impl LogEntry {
    /// Text used when records are concatenated into a Q&A context.
    pub fn context_line(&self) -> String {
        let mut line = format!(
            "[{}] {} at {} ({}, {}): {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.activity_type,
            self.location,
            self.category,
            self.status,
            self.notes
        );
        if !self.equipment.is_empty() {
            line.push_str(&format!(" | equipment: {}", self.equipment.join(", ")));
        }
        if !self.personnel.is_empty() {
            line.push_str(&format!(" | personnel: {}", self.personnel.join(", ")));
        }
        if let Some(material) = &self.material {
            line.push_str(&format!(" | material: {material}"));
        }
        line
    }
}

/// Metadata supplied alongside ingested text, used as a fallback source for defaults.
#[derive(Debug, Clone, Default)]
pub struct IngestDefaults {
    pub recorded_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub video_title: Option<String>,
}

/// LogEntry shape as returned by the AI extraction endpoint: every field may be absent.
/// Values of the wrong type are read as absent instead of failing the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLogEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    #[serde(default, alias = "type", deserialize_with = "lenient_string")]
    pub activity_type: Option<String>,
    #[serde(default, alias = "description", deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub material: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub equipment: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub personnel: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub media_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub episode_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference_id: Option<String>,
}

impl PartialLogEntry {
    /// Completes the record, backfilling id, timestamp, status, reference id and
    /// placeholder strings. Never fails: malformed input is patched, not rejected.
    pub fn into_entry(self, defaults: &IngestDefaults, now: DateTime<Utc>) -> LogEntry {
        let timestamp = self.timestamp.unwrap_or_else(|| {
            defaults
                .recorded_date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
                .unwrap_or(now)
        });

        let location = non_blank(self.location)
            .or_else(|| non_blank(defaults.location.clone()))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        LogEntry {
            id: non_blank(self.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp,
            location,
            category: non_blank(self.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            activity_type: non_blank(self.activity_type)
                .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
            notes: self.notes.unwrap_or_default().trim().to_string(),
            material: non_blank(self.material),
            equipment: clean_list(self.equipment),
            personnel: clean_list(self.personnel),
            media_url: non_blank(self.media_url),
            coordinates: self.coordinates,
            episode_id: non_blank(self.episode_id),
            status: self
                .status
                .as_deref()
                .map(LogStatus::parse_lenient)
                .unwrap_or(LogStatus::Completed),
            reference_id: non_blank(self.reference_id).unwrap_or_else(|| generate_reference_id(now)),
            video_title: defaults.video_title.clone(),
        }
    }
}

/// `REF-` followed by the millisecond timestamp and a random suffix, digits only.
pub fn generate_reference_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().as_u128() % 1000;
    format!("REF-{}{:03}", now.timestamp_millis().unsigned_abs(), suffix)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_string());
    }
    out
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strings as-is, numbers and booleans as text, anything else as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(scalar_text))
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// RFC 3339, common naive forms (read as UTC), a bare date (midnight UTC), or
/// Unix seconds/milliseconds. Anything else is absent.
pub fn parse_timestamp_lenient(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
                return Some(ts.with_timezone(&Utc));
            }
            if let Some(naive) = NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            {
                return Some(Utc.from_utc_datetime(&naive));
            }
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| Utc.from_utc_datetime(&naive))
        }
        Value::Number(n) => {
            let n = n.as_i64()?;
            if n.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(n)
            } else {
                DateTime::from_timestamp(n, 0)
            }
        }
        _ => None,
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(parse_timestamp_lenient))
}

fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Option<Coordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .and_then(|v| serde_json::from_value::<Coordinates>(v).ok())
        .filter(|c| c.lat.is_finite() && c.lng.is_finite()))
}

/// Accepts `["a", "b"]`, `"a, b"` or `null`. Non-text items are skipped.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.split(',').map(|p| p.trim().to_string()).collect(),
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

/// A `logs` array where records that are not objects are skipped and a
/// non-array value reads as empty.
pub fn lenient_partials<'de, D>(deserializer: D) -> Result<Vec<PartialLogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A row of the hosted transcriptions table.
#[derive(Debug, Clone, FromRow)]
pub struct TranscriptionRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub video_title: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub activity_type: Option<String>,
    pub notes: Option<String>,
    pub material: Option<String>,
    pub equipment: Option<String>,
    pub personnel: Option<String>,
    pub media_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub episode_id: Option<String>,
    pub status: Option<String>,
    pub reference_id: Option<String>,
}

impl TranscriptionRow {
    pub fn into_entry(self) -> LogEntry {
        let split = |s: Option<String>| -> Vec<String> {
            s.map(|v| v.split(',').map(|p| p.trim().to_string()).collect())
                .unwrap_or_default()
        };
        let coordinates = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        };
        let defaults = IngestDefaults {
            video_title: self.video_title.clone(),
            ..Default::default()
        };
        PartialLogEntry {
            id: Some(self.id.to_string()),
            timestamp: Some(self.created_at),
            location: self.location,
            category: self.category,
            activity_type: self.activity_type,
            notes: self.notes,
            material: self.material,
            equipment: split(self.equipment),
            personnel: split(self.personnel),
            media_url: self.media_url,
            coordinates,
            episode_id: self.episode_id,
            status: self.status,
            reference_id: self.reference_id,
        }
        .into_entry(&defaults, self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_missing_status_defaults_to_completed() {
        let entry = PartialLogEntry::default().into_entry(&IngestDefaults::default(), now());
        assert_eq!(entry.status, LogStatus::Completed);
    }

    #[test]
    fn test_missing_reference_id_gets_ref_digits() {
        let entry = PartialLogEntry::default().into_entry(&IngestDefaults::default(), now());
        let digits = entry.reference_id.strip_prefix("REF-").expect("REF- prefix");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()), "{}", entry.reference_id);
    }

    #[test]
    fn test_missing_fields_are_backfilled() {
        let entry = PartialLogEntry::default().into_entry(&IngestDefaults::default(), now());
        assert!(!entry.id.is_empty());
        assert_eq!(entry.timestamp, now());
        assert_eq!(entry.location, UNKNOWN_LOCATION);
        assert_eq!(entry.category, DEFAULT_CATEGORY);
        assert_eq!(entry.activity_type, DEFAULT_ACTIVITY);
    }

    #[test]
    fn test_recorded_date_and_location_used_as_fallbacks() {
        let defaults = IngestDefaults {
            recorded_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            location: Some("Block C".to_string()),
            video_title: Some("Day 2".to_string()),
        };
        let entry = PartialLogEntry {
            location: Some("   ".to_string()),
            ..Default::default()
        }
        .into_entry(&defaults, now());
        assert_eq!(entry.location, "Block C");
        assert_eq!(entry.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(entry.video_title.as_deref(), Some("Day 2"));
    }

    #[test]
    fn test_existing_values_are_kept() {
        let entry = PartialLogEntry {
            id: Some("log-1".to_string()),
            status: Some("In Progress".to_string()),
            reference_id: Some("REF-42".to_string()),
            ..Default::default()
        }
        .into_entry(&IngestDefaults::default(), now());
        assert_eq!(entry.id, "log-1");
        assert_eq!(entry.status, LogStatus::InProgress);
        assert_eq!(entry.reference_id, "REF-42");
    }

    #[test]
    fn test_status_parse_is_lenient() {
        assert_eq!(LogStatus::parse_lenient("in-progress"), LogStatus::InProgress);
        assert_eq!(LogStatus::parse_lenient("Canceled"), LogStatus::Cancelled);
        assert_eq!(LogStatus::parse_lenient("whatever"), LogStatus::Completed);
    }

    #[test]
    fn test_list_fields_accept_comma_string() {
        let partial: PartialLogEntry = serde_json::from_str(
            r#"{"equipment": "Crane, Excavator, crane", "personnel": ["Ana", " "], "type": "Pour"}"#,
        )
        .unwrap();
        let entry = partial.into_entry(&IngestDefaults::default(), now());
        assert_eq!(entry.equipment, vec!["Crane", "Excavator"]);
        assert_eq!(entry.personnel, vec!["Ana"]);
        assert_eq!(entry.activity_type, "Pour");
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = PartialLogEntry::default().into_entry(&IngestDefaults::default(), now());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("referenceId").is_some());
        assert!(json.get("activityType").is_some());
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_wrong_typed_fields_read_as_absent() {
        let partial: PartialLogEntry = serde_json::from_str(
            r#"{"id": 7, "timestamp": "yesterday", "coordinates": "north", "location": {"x": 1},
                "equipment": ["Pump", 3, null], "status": false}"#,
        )
        .unwrap();
        assert_eq!(partial.id.as_deref(), Some("7"));
        assert!(partial.timestamp.is_none());
        assert!(partial.coordinates.is_none());
        assert!(partial.location.is_none());
        assert_eq!(partial.equipment, vec!["Pump", "3"]);
        let entry = partial.into_entry(&IngestDefaults::default(), now());
        assert_eq!(entry.timestamp, now());
        assert_eq!(entry.status, LogStatus::Completed);
    }

    #[test]
    fn test_naive_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 8, 9, 30, 0).unwrap();
        for raw in ["2024-05-08 09:30", "2024-05-08T09:30:00", "2024-05-08T09:30:00Z"] {
            assert_eq!(
                parse_timestamp_lenient(&Value::String(raw.to_string())),
                Some(expected),
                "{raw}"
            );
        }
        assert_eq!(
            parse_timestamp_lenient(&Value::String("2024-05-08".to_string())),
            Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).single()
        );
        assert_eq!(
            parse_timestamp_lenient(&serde_json::json!(expected.timestamp_millis())),
            Some(expected)
        );
    }
}
