//! Boundary normalization for the backend's dynamic JSON shapes.
//!
//! The REST backend is inconsistent about reference fields: `assignedTo` and
//! `assignedAdmin(s)` arrive as a raw id string, an array of ids, a populated
//! object, or an array of objects. Monetary fields arrive as numbers or
//! numeric strings, and timestamps in several ISO variants. Everything is
//! folded into one canonical shape here so no downstream code branches on
//! shape. Malformed values normalize to empty/`None` with a logged
//! diagnostic; deserialization itself never fails on them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::types::SubjectRef;

/// A user reference in any of the shapes the backend emits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RefShape {
    Id(String),
    Object {
        #[serde(rename = "_id", alias = "id", default)]
        id: String,
        #[serde(default, alias = "name")]
        username: Option<String>,
    },
    /// Anything else the backend might emit; dropped with a diagnostic.
    Unexpected(serde_json::Value),
}

impl RefShape {
    fn into_ref(self) -> Option<SubjectRef> {
        match self {
            RefShape::Id(id) if !id.trim().is_empty() => Some(SubjectRef::new(id)),
            RefShape::Id(_) => None,
            RefShape::Object { id, username } => {
                if id.trim().is_empty() {
                    log::debug!("dropping user reference object without id");
                    None
                } else {
                    Some(SubjectRef { id, username })
                }
            }
            RefShape::Unexpected(value) => {
                log::debug!("dropping user reference of unexpected shape: {}", value);
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RefShape>),
    One(RefShape),
}

/// Deserialize `null | id | object | [id | object, ...]` into a canonical
/// reference list.
pub fn subject_refs<'de, D>(deserializer: D) -> Result<Vec<SubjectRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(match raw {
        None => Vec::new(),
        Some(OneOrMany::One(shape)) => shape.into_ref().into_iter().collect(),
        Some(OneOrMany::Many(shapes)) => {
            shapes.into_iter().filter_map(RefShape::into_ref).collect()
        }
    })
}

/// Deserialize `null | id | object` into an optional canonical reference.
pub fn opt_subject_ref<'de, D>(deserializer: D) -> Result<Option<SubjectRef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RefShape>::deserialize(deserializer)?;
    Ok(raw.and_then(RefShape::into_ref))
}

/// Deserialize a monetary field that may be a number or a numeric string.
/// Non-numeric text normalizes to `None` rather than failing the document.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
        Unexpected(serde_json::Value),
    }

    Ok(match Option::<RawAmount>::deserialize(deserializer)? {
        None => None,
        Some(RawAmount::Number(n)) => Some(n),
        Some(RawAmount::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                match trimmed.parse::<f64>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        log::debug!("non-numeric amount '{}' normalized to none", s);
                        None
                    }
                }
            }
        }
        Some(RawAmount::Unexpected(value)) => {
            log::debug!("amount of unexpected shape {} normalized to none", value);
            None
        }
    })
}

/// Deserialize a timestamp string, tolerating the formats seen in backend
/// payloads. Unparsable values normalize to `None`.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimestamp {
        Text(String),
        /// Epoch milliseconds, as some serializers emit for dates.
        Millis(i64),
        Unexpected(serde_json::Value),
    }

    Ok(match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => None,
        Some(RawTimestamp::Text(s)) => {
            let parsed = parse_timestamp(&s);
            if parsed.is_none() && !s.trim().is_empty() {
                log::debug!("unparsable timestamp '{}' normalized to none", s);
            }
            parsed
        }
        Some(RawTimestamp::Millis(ms)) => DateTime::from_timestamp_millis(ms),
        Some(RawTimestamp::Unexpected(value)) => {
            log::debug!("timestamp of unexpected shape {} normalized to none", value);
            None
        }
    })
}

/// Parse a timestamp in any accepted format into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Naive ISO without offset, with or without fractional seconds.
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    // Bare date: treat as midnight.
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

/// Parse a date-picker bound. Accepts a bare date or any timestamp format.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(trimmed).map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entry;

    #[test]
    fn assigned_to_accepts_every_observed_shape() {
        let cases = [
            (r#"{"id": "e1"}"#, 0),
            (r#"{"id": "e1", "assignedTo": null}"#, 0),
            (r#"{"id": "e1", "assignedTo": "u1"}"#, 1),
            (r#"{"id": "e1", "assignedTo": ["u1", "u2"]}"#, 2),
            (r#"{"id": "e1", "assignedTo": {"_id": "u1", "username": "x"}}"#, 1),
            (
                r#"{"id": "e1", "assignedTo": [{"_id": "u1"}, "u2", {"_id": ""}]}"#,
                2,
            ),
        ];
        for (json, expected) in cases {
            let entry: Entry = serde_json::from_str(json).expect(json);
            assert_eq!(entry.assigned_to.len(), expected, "payload: {}", json);
        }
    }

    #[test]
    fn populated_object_keeps_username() {
        let entry: Entry = serde_json::from_str(
            r#"{"id": "e1", "createdBy": {"_id": "u1", "username": "priya"}}"#,
        )
        .expect("deserialize");
        let creator = entry.created_by.expect("creator");
        assert_eq!(creator.id, "u1");
        assert_eq!(creator.username.as_deref(), Some("priya"));
    }

    #[test]
    fn amount_accepts_number_and_numeric_string() {
        let entry: Entry =
            serde_json::from_str(r#"{"id": "e1", "estimatedValue": 1500}"#).expect("number");
        assert_eq!(entry.estimated_value, Some(1500.0));

        let entry: Entry =
            serde_json::from_str(r#"{"id": "e1", "estimatedValue": "1500.5"}"#).expect("string");
        assert_eq!(entry.estimated_value, Some(1500.5));
    }

    #[test]
    fn non_numeric_amount_normalizes_to_none() {
        let entry: Entry =
            serde_json::from_str(r#"{"id": "e1", "closeamount": "pending"}"#).expect("deserialize");
        assert_eq!(entry.close_amount, None);
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-05-01T10:30:00.000Z").is_some());
        assert!(parse_timestamp("2024-05-01T10:30:00+05:30").is_some());
        assert!(parse_timestamp("2024-05-01T10:30:00").is_some());
        assert!(parse_timestamp("2024-05-01 10:30:00").is_some());
        assert!(parse_timestamp("2024-05-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn epoch_millis_timestamp_is_accepted() {
        let entry: Entry =
            serde_json::from_str(r#"{"id": "e1", "createdAt": 1714558200000}"#).expect("millis");
        assert!(entry.created_at.is_some());
    }

    #[test]
    fn unexpected_shapes_never_fail_the_document() {
        let entry: Entry = serde_json::from_str(
            r#"{
                "id": "e1",
                "assignedTo": [42, {"username": "no-id"}],
                "estimatedValue": {"amount": 100},
                "createdAt": {"$date": "2024-05-01"}
            }"#,
        )
        .expect("deserialize");
        assert!(entry.assigned_to.is_empty());
        assert_eq!(entry.estimated_value, None);
        assert_eq!(entry.created_at, None);
    }

    #[test]
    fn unparsable_created_at_normalizes_to_none() {
        let entry: Entry =
            serde_json::from_str(r#"{"id": "e1", "createdAt": "not-a-date"}"#).expect("deserialize");
        assert_eq!(entry.created_at, None);
    }

    #[test]
    fn date_bound_accepts_bare_date_and_timestamp() {
        assert_eq!(
            parse_date("2024-05-01"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(
            parse_date("2024-05-01T18:00:00Z"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_date("soon"), None);
    }
}
