use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::legacy;

/// Title used when nothing meaningful survives extraction
pub const UNKNOWN_TITLE: &str = "Unknown Movie";

/// Display value for any attribute that could not be determined
pub const NOT_AVAILABLE: &str = "N/A";

/// Content classification of an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentTag {
    #[serde(rename = "#MOVIE")]
    Movie,
    #[serde(rename = "#SERIES")]
    Series,
}

impl Default for ContentTag {
    fn default() -> Self {
        Self::Movie
    }
}

impl std::fmt::Display for ContentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentTag::Movie => write!(f, "#MOVIE"),
            ContentTag::Series => write!(f, "#SERIES"),
        }
    }
}

/// A new file seen in the database channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestEvent {
    pub filename: String,
    pub size_bytes: u64,
    pub caption: Option<String>,
    pub message_id: i64,
    pub file_id: String,
}

/// Everything derived from one filename (+ caption)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Filename without its extension
    pub processed_name: String,
    pub title: String,
    pub year: Option<String>,
    /// Ordered, deduplicated; empty means unknown
    pub quality: Vec<String>,
    /// Ordered, deduplicated; empty means unknown
    pub language: Vec<String>,
    pub season: Option<u32>,
    /// Single number ("5") or range ("12-15")
    pub episode: Option<String>,
    pub tag: ContentTag,
    pub size_display: String,
}

impl MediaMetadata {
    pub fn quality_display(&self) -> String {
        join_or_na(&self.quality)
    }

    pub fn language_display(&self) -> String {
        join_or_na(&self.language)
    }
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.join(", ")
    }
}

/// One ingested video file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    #[serde(rename = "processed", default)]
    pub processed_name: String,
    #[serde(default)]
    pub message_id: i64,
    #[serde(deserialize_with = "legacy::string_or_number")]
    pub file_id: String,
    #[serde(rename = "file_size_bytes", default)]
    pub size_bytes: u64,
    #[serde(rename = "file_size", default)]
    pub size_display: String,
    /// `None` only for records loaded with a missing or malformed timestamp
    #[serde(default, with = "legacy::timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "legacy::list_or_joined")]
    pub quality: Vec<String>,
    #[serde(default, deserialize_with = "legacy::list_or_joined")]
    pub language: Vec<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode: Option<String>,
}

impl FileRecord {
    pub fn new(event: &IngestEvent, metadata: &MediaMetadata, created_at: DateTime<Utc>) -> Self {
        Self {
            filename: event.filename.clone(),
            processed_name: metadata.processed_name.clone(),
            message_id: event.message_id,
            file_id: event.file_id.clone(),
            size_bytes: event.size_bytes,
            size_display: metadata.size_display.clone(),
            timestamp: Some(created_at),
            quality: metadata.quality.clone(),
            language: metadata.language.clone(),
            year: metadata.year.clone(),
            season: metadata.season,
            episode: metadata.episode.clone(),
        }
    }
}

/// Why a file was not added to an aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    SameNameAndSize,
    SameFileId,
}

impl std::fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicateReason::SameNameAndSize => write!(f, "same filename and size"),
            DuplicateReason::SameFileId => write!(f, "same file id"),
        }
    }
}

/// Accumulated state for one canonical title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieAggregate {
    pub title: String,
    /// Insertion order
    pub files: Vec<FileRecord>,
    pub qualities: BTreeSet<String>,
    pub languages: BTreeSet<String>,
    pub episodes_by_season: BTreeMap<u32, BTreeSet<String>>,
    pub tag: ContentTag,
    pub channel_message_id: Option<i64>,
    /// A poster fetch has been attempted and succeeded; never retried
    pub poster_attached: bool,
    /// The live channel post is a photo with caption
    pub post_is_photo: bool,
}

impl MovieAggregate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            files: Vec::new(),
            qualities: BTreeSet::new(),
            languages: BTreeSet::new(),
            episodes_by_season: BTreeMap::new(),
            tag: ContentTag::Movie,
            channel_message_id: None,
            poster_attached: false,
            post_is_photo: false,
        }
    }

    /// Check whether `file` is already part of this aggregate
    pub fn duplicate_of(&self, file: &FileRecord) -> Option<DuplicateReason> {
        for existing in &self.files {
            if existing.filename == file.filename && existing.size_bytes == file.size_bytes {
                return Some(DuplicateReason::SameNameAndSize);
            }
            if existing.file_id == file.file_id {
                return Some(DuplicateReason::SameFileId);
            }
        }
        None
    }

    /// Append a file and fold its attributes into the aggregate.
    ///
    /// Sets only grow. Once tagged SERIES the aggregate stays SERIES.
    pub fn absorb(&mut self, file: FileRecord) {
        self.qualities.extend(file.quality.iter().cloned());
        self.languages.extend(file.language.iter().cloned());

        if let Some(season) = file.season {
            self.tag = ContentTag::Series;
            if let Some(episode) = &file.episode {
                self.episodes_by_season
                    .entry(season)
                    .or_default()
                    .insert(episode.clone());
            }
        }

        self.files.push(file);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_series(&self) -> bool {
        self.tag == ContentTag::Series
    }

    /// Earliest year mentioned by any file
    pub fn year(&self) -> Option<&str> {
        self.files.iter().filter_map(|f| f.year.as_deref()).min()
    }

    /// Newest creation time among files with a usable timestamp
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.files.iter().filter_map(|f| f.timestamp).max()
    }

    pub fn to_persisted(&self) -> PersistedRecord {
        PersistedRecord {
            files: self.files.clone(),
            qualities: self.qualities.iter().cloned().collect(),
            languages: self.languages.iter().cloned().collect(),
            message_id: self.channel_message_id,
            is_photo: self.post_is_photo,
            tag: self.tag,
            episodes_by_season: self
                .episodes_by_season
                .iter()
                .map(|(season, episodes)| (season.to_string(), episodes.iter().cloned().collect()))
                .collect(),
            poster_fetched: self.poster_attached,
        }
    }

    pub fn from_persisted(title: impl Into<String>, record: PersistedRecord) -> Self {
        let episodes_by_season = record
            .episodes_by_season
            .into_iter()
            .filter_map(|(season, episodes)| {
                let season: u32 = season.trim().parse().ok()?;
                Some((season, episodes.into_iter().collect::<BTreeSet<_>>()))
            })
            .collect::<BTreeMap<_, _>>();

        // Older records could carry a MOVIE tag alongside episodes
        let tag = if episodes_by_season.is_empty() {
            record.tag
        } else {
            ContentTag::Series
        };

        Self {
            title: title.into(),
            files: record.files,
            qualities: record.qualities.into_iter().collect(),
            languages: record.languages.into_iter().collect(),
            episodes_by_season,
            tag,
            channel_message_id: record.message_id,
            poster_attached: record.is_photo || record.poster_fetched,
            post_is_photo: record.is_photo,
        }
    }
}

/// Serializable projection of a `MovieAggregate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub qualities: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub is_photo: bool,
    #[serde(default)]
    pub tag: ContentTag,
    #[serde(default)]
    pub episodes_by_season: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub poster_fetched: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn file(name: &str, size: u64, id: &str) -> FileRecord {
        FileRecord {
            filename: name.to_string(),
            processed_name: name.to_string(),
            message_id: 1,
            file_id: id.to_string(),
            size_bytes: size,
            size_display: "1.00 GB".to_string(),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            quality: vec!["720p".to_string()],
            language: vec!["Hindi".to_string()],
            year: Some("2023".to_string()),
            season: None,
            episode: None,
        }
    }

    #[test]
    fn test_duplicate_detection() {
        let mut agg = MovieAggregate::new("Movie Name");
        agg.absorb(file("a.mkv", 100, "f1"));

        assert_eq!(
            agg.duplicate_of(&file("a.mkv", 100, "f2")),
            Some(DuplicateReason::SameNameAndSize)
        );
        assert_eq!(
            agg.duplicate_of(&file("b.mkv", 200, "f1")),
            Some(DuplicateReason::SameFileId)
        );
        assert_eq!(agg.duplicate_of(&file("a.mkv", 101, "f3")), None);
    }

    #[test]
    fn test_series_tag_is_sticky() {
        let mut agg = MovieAggregate::new("Show");
        let mut episode = file("show.s01e02.mkv", 1, "e2");
        episode.season = Some(1);
        episode.episode = Some("2".to_string());
        agg.absorb(episode);
        agg.absorb(file("show.extras.mkv", 2, "x"));

        assert_eq!(agg.tag, ContentTag::Series);
        assert_eq!(agg.episodes_by_season[&1].len(), 1);
    }

    #[test]
    fn test_sets_only_grow() {
        let mut agg = MovieAggregate::new("Movie");
        agg.absorb(file("a.mkv", 1, "a"));
        let before = agg.qualities.clone();

        let mut second = file("b.mkv", 2, "b");
        second.quality = vec![];
        second.language = vec!["Tamil".to_string()];
        agg.absorb(second);

        assert!(agg.qualities.is_superset(&before));
        assert!(agg.languages.contains("Hindi"));
        assert!(agg.languages.contains("Tamil"));
    }

    #[test]
    fn test_persisted_round_trip() {
        let mut agg = MovieAggregate::new("Show Name");
        let mut ep = file("Show.S02E05.mkv", 10, "s2e5");
        ep.season = Some(2);
        ep.episode = Some("5".to_string());
        agg.absorb(ep);
        agg.absorb(file("Show.S02E06.mkv", 11, "s2e6"));
        agg.channel_message_id = Some(77);
        agg.poster_attached = true;
        agg.post_is_photo = true;

        let json = serde_json::to_string(&agg.to_persisted()).unwrap();
        let record: PersistedRecord = serde_json::from_str(&json).unwrap();
        let restored = MovieAggregate::from_persisted("Show Name", record);

        assert_eq!(restored, agg);
    }

    #[test]
    fn test_year_is_earliest() {
        let mut agg = MovieAggregate::new("Movie");
        let mut newer = file("a.mkv", 1, "a");
        newer.year = Some("2024".to_string());
        agg.absorb(newer);
        agg.absorb(file("b.mkv", 2, "b"));

        assert_eq!(agg.year(), Some("2023"));
    }
}
