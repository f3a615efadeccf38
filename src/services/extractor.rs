use crate::models::{ContentTag, MediaMetadata, NOT_AVAILABLE};
use crate::services::patterns::{
    trim_token, AUDIO_DESCRIPTORS, BRACKET_CONTENT, BRACKET_SPLIT, EPISODE_RANGE, HASHTAG,
    KNOWN_RESOLUTIONS, LANGUAGES, LANGUAGE_NAME, NAMED_SEASON_EPISODE, QUALITY_TOKENS, RESOLUTION,
    SEASON_EPISODE, SEASON_RANGE, TOKEN_SPLIT, TRAILING_EPISODE, TRAILING_SEASON,
    TRAILING_SEASON_EPISODE, YEAR_IN_NAME,
};
use crate::services::tokenizer;

/// Metadata extractor for uploaded video files
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Derive everything we know about a file from its name, size and caption.
    ///
    /// Never fails: anything that cannot be determined is left empty/None.
    pub fn extract(filename: &str, size_bytes: u64, caption: Option<&str>) -> MediaMetadata {
        let caption = caption.unwrap_or("");
        let processed_name = tokenizer::strip_extension(filename).to_string();

        let mut title = tokenizer::extract_title(filename);
        let year = Self::extract_year(filename);
        let quality = Self::extract_quality(filename);
        let language = Self::merge_languages(
            Self::languages_from_caption(caption),
            Self::languages_from_filename(filename),
        );

        let (season, episode) = match Self::extract_season_episode(filename) {
            Some((season, episode)) => (Some(season), Some(episode)),
            None => (None, None),
        };

        let tag = if season.is_some() {
            ContentTag::Series
        } else {
            ContentTag::Movie
        };

        if tag == ContentTag::Series {
            title = Self::series_base_title(&title, year.as_deref());
        }

        let metadata = MediaMetadata {
            processed_name,
            title,
            year,
            quality,
            language,
            season,
            episode,
            tag,
            size_display: format_file_size(size_bytes),
        };

        tracing::debug!(
            filename = %filename,
            title = %metadata.title,
            year = ?metadata.year,
            quality = %metadata.quality_display(),
            language = %metadata.language_display(),
            season = ?metadata.season,
            episode = ?metadata.episode,
            tag = %metadata.tag,
            "Extracted media info"
        );

        metadata
    }

    /// First standalone 19xx/20xx year in the filename
    pub fn extract_year(filename: &str) -> Option<String> {
        YEAR_IN_NAME
            .captures(filename)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Quality tags from the token table plus bare resolutions, in order of
    /// appearance. The container extension is never read as a tag.
    pub fn extract_quality(filename: &str) -> Vec<String> {
        let filename = tokenizer::strip_extension(filename);
        let mut found: Vec<String> = Vec::new();

        for token in TOKEN_SPLIT.split(filename) {
            let key = trim_token(token).to_lowercase();
            if let Some(display) = QUALITY_TOKENS.get(key.as_str()) {
                push_unique(&mut found, display);
            }
        }

        for caps in RESOLUTION.captures_iter(filename) {
            if let Some(value) = caps.get(1).map(|m| m.as_str()) {
                if KNOWN_RESOLUTIONS.contains(&value) {
                    push_unique(&mut found, &format!("{}p", value));
                }
            }
        }

        found
    }

    /// Languages named in the filename.
    ///
    /// A bracketed `[Tam + Tel + Hin]` list wins when it yields anything;
    /// otherwise every token is looked up.
    pub fn languages_from_filename(filename: &str) -> Vec<String> {
        if let Some(content) = BRACKET_CONTENT
            .captures(filename)
            .and_then(|caps| caps.get(1))
        {
            let mut found = Vec::new();
            for part in BRACKET_SPLIT.split(content.as_str()) {
                if let Some(name) = LANGUAGES.get(part.trim().to_lowercase().as_str()) {
                    push_unique(&mut found, name);
                }
            }
            if !found.is_empty() {
                return found;
            }
        }

        let mut found = Vec::new();
        for token in TOKEN_SPLIT.split(filename) {
            let raw = token.to_lowercase();
            let cleaned = trim_token(&raw);
            for candidate in [cleaned, raw.as_str()] {
                if let Some(name) = LANGUAGES
                    .get(candidate)
                    .or_else(|| AUDIO_DESCRIPTORS.get(candidate))
                {
                    push_unique(&mut found, name);
                }
            }
        }
        found
    }

    /// Languages tagged (`#Hindi`) or named (`Tamil`, `HindiDubbed`) in a caption
    pub fn languages_from_caption(caption: &str) -> Vec<String> {
        let mut found = Vec::new();
        if caption.is_empty() {
            return found;
        }

        for caps in HASHTAG.captures_iter(caption) {
            if let Some(tag) = caps.get(1) {
                if let Some(name) = LANGUAGES.get(tag.as_str().to_lowercase().as_str()) {
                    push_unique(&mut found, name);
                }
            }
        }

        for m in LANGUAGE_NAME.find_iter(caption) {
            if let Some(name) = LANGUAGES.get(m.as_str().to_lowercase().as_str()) {
                push_unique(&mut found, name);
            }
        }

        found
    }

    /// Caption languages first, then filename languages not already listed
    pub fn merge_languages(from_caption: Vec<String>, from_filename: Vec<String>) -> Vec<String> {
        let mut merged = from_caption;
        for lang in from_filename {
            push_unique(&mut merged, &lang);
        }
        merged
    }

    /// Season and episode token, trying each pattern in priority order.
    ///
    /// Episode ranges without a season are assigned to season 1.
    pub fn extract_season_episode(filename: &str) -> Option<(u32, String)> {
        if let Some(caps) = EPISODE_RANGE.captures(filename) {
            if let (Some(start), Some(end)) = (number(&caps, 1), number(&caps, 2)) {
                return Some((1, format!("{}-{}", start, end)));
            }
        }

        if let Some(caps) = SEASON_RANGE.captures(filename) {
            if let (Some(season), Some(start), Some(end)) =
                (number(&caps, 1), number(&caps, 2), number(&caps, 3))
            {
                if season > 0 {
                    return Some((season, format!("{}-{}", start, end)));
                }
            }
        }

        for pattern in [&*SEASON_EPISODE, &*NAMED_SEASON_EPISODE] {
            if let Some(caps) = pattern.captures(filename) {
                if let (Some(season), Some(episode)) = (number(&caps, 1), number(&caps, 2)) {
                    if season > 0 {
                        return Some((season, episode.to_string()));
                    }
                }
            }
        }

        None
    }

    /// Drop any season/episode suffix (and the year) left in a series title
    pub fn series_base_title(title: &str, year: Option<&str>) -> String {
        let base = TRAILING_SEASON_EPISODE.replace(title, "");
        let base = TRAILING_SEASON.replace(&base, "");
        let mut base = TRAILING_EPISODE.replace(&base, "").into_owned();

        if let Some(year) = year {
            base = base.replace(year, "");
        }

        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
        if base.is_empty() {
            title.to_string()
        } else {
            base
        }
    }
}

fn number(caps: &regex::Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Human-readable size using binary units, `N/A` for zero
pub fn format_file_size(size_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = size_bytes as f64;
    if size_bytes == 0 {
        NOT_AVAILABLE.to_string()
    } else if size < KB {
        format!("{} B", size_bytes)
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}
