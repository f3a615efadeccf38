//! Serde helpers that accept the older persisted record shapes.
//!
//! Records written by earlier deployments stored file ids as integers,
//! quality/language as comma-joined strings, and timestamps as naive
//! ISO strings without an offset.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Text(s) => s,
        StringOrNumber::Signed(n) => n.to_string(),
        StringOrNumber::Unsigned(n) => n.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrJoined {
    List(Vec<String>),
    Joined(String),
    Missing(()),
}

/// `["a", "b"]`, `"a, b"`, `"N/A"` and `null` are all accepted
pub fn list_or_joined<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ListOrJoined::deserialize(deserializer)? {
        ListOrJoined::List(values) => values,
        ListOrJoined::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != super::NOT_AVAILABLE)
            .map(str::to_string)
            .collect(),
        ListOrJoined::Missing(()) => Vec::new(),
    })
}

pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    /// Malformed values load as `None` instead of failing the whole record
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(serde_json::Value::String(s)) => {
                let parsed = parse(&s);
                if parsed.is_none() {
                    tracing::warn!(timestamp = %s, "Unparseable file timestamp in stored record");
                }
                parsed
            }
            Some(serde_json::Value::Null) | None => None,
            Some(other) => {
                tracing::warn!(timestamp = %other, "Unexpected file timestamp type in stored record");
                None
            }
        })
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::FileRecord;

    #[test]
    fn test_legacy_file_record() {
        let json = r#"{
            "filename": "Movie.2023.720p.mkv",
            "processed": "Movie.2023.720p.mkv",
            "message_id": 12,
            "file_id": 5566778899,
            "file_size_bytes": 1024,
            "timestamp": "2024-03-01T10:20:30.123456",
            "quality": "720p, HD",
            "language": "N/A",
            "year": "2023",
            "season": null,
            "episode": null,
            "file_size": "1.00 KB"
        }"#;

        let record: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.file_id, "5566778899");
        assert_eq!(record.quality, vec!["720p", "HD"]);
        assert!(record.language.is_empty());
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_malformed_timestamp_loads_as_missing() {
        let json = r#"{"filename": "a.mkv", "file_id": "x", "timestamp": "yesterday"}"#;
        let record: FileRecord = serde_json::from_str(json).unwrap();
        assert!(record.timestamp.is_none());
    }
}
