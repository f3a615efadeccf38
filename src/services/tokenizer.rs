//! Filename tokenizer and title classifier.
//!
//! A filename is split into tokens which are classified in order. Noise
//! tokens are dropped, the first metadata token (year, quality, language,
//! series marker, file size) ends the title, and everything kept before it
//! becomes the title.

use lazy_static::lazy_static;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::models::UNKNOWN_TITLE;
use crate::services::patterns::{
    clean_token, CHANNEL_NOISE, FILE_SIZE_TOKEN, IGNORE_WORDS, LANGUAGES, MEDIA_EXTENSIONS,
    MENTIONS_AND_LINKS, QUALITY_TOKEN, SERIES_MARKER_TOKEN, TOKEN_SPLIT, YEAR_IN_NAME, YEAR_TOKEN,
};

const TITLE_CACHE_SIZE: usize = 4096;

lazy_static! {
    static ref TITLE_CACHE: Mutex<LruCache<String, String>> = Mutex::new(LruCache::new(
        NonZeroUsize::new(TITLE_CACHE_SIZE).unwrap()
    ));
}

/// Why title classification stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Year,
    Quality,
    Language,
    SeriesMarker,
    FileSize,
    /// Every token was consumed without hitting a boundary
    Exhausted,
}

/// Outcome of classifying a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Nothing left after stripping leading noise characters
    Empty,
    Ignored,
    ChannelNoise,
    Boundary(StopReason),
    /// Single non-alphabetic character
    TooShort,
    Keep,
}

type Predicate = fn(cleaned: &str, lower: &str) -> bool;

fn is_ignore_word(_: &str, lower: &str) -> bool {
    IGNORE_WORDS.contains(lower)
}

fn is_channel_noise(_: &str, lower: &str) -> bool {
    CHANNEL_NOISE.iter().any(|fragment| lower.contains(fragment))
}

fn is_year(cleaned: &str, _: &str) -> bool {
    YEAR_TOKEN.is_match(cleaned)
}

fn is_quality(cleaned: &str, _: &str) -> bool {
    QUALITY_TOKEN.is_match(cleaned)
}

fn is_language(_: &str, lower: &str) -> bool {
    LANGUAGES.contains_key(lower)
}

fn is_series_marker(cleaned: &str, _: &str) -> bool {
    SERIES_MARKER_TOKEN.is_match(cleaned)
}

fn is_file_size(cleaned: &str, _: &str) -> bool {
    FILE_SIZE_TOKEN.is_match(cleaned)
}

/// Classification rules, first match wins
static RULES: &[(Predicate, TokenClass)] = &[
    (is_ignore_word, TokenClass::Ignored),
    (is_channel_noise, TokenClass::ChannelNoise),
    (is_year, TokenClass::Boundary(StopReason::Year)),
    (is_quality, TokenClass::Boundary(StopReason::Quality)),
    (is_language, TokenClass::Boundary(StopReason::Language)),
    (is_series_marker, TokenClass::Boundary(StopReason::SeriesMarker)),
    (is_file_size, TokenClass::Boundary(StopReason::FileSize)),
];

/// Split a name on whitespace, hyphen, underscore, dot and tilde
pub fn tokenize(name: &str) -> Vec<&str> {
    TOKEN_SPLIT.split(name).filter(|t| !t.is_empty()).collect()
}

/// Classify one raw token; returns the class and the cleaned token
pub fn classify_token(token: &str) -> (TokenClass, &str) {
    let cleaned = clean_token(token);
    if cleaned.is_empty() {
        return (TokenClass::Empty, cleaned);
    }

    let lower = cleaned.to_lowercase();
    for (predicate, class) in RULES {
        if predicate(cleaned, &lower) {
            return (*class, cleaned);
        }
    }

    let mut chars = cleaned.chars();
    let first = chars.next();
    let single = chars.next().is_none();
    if single && !first.map_or(false, char::is_alphabetic) {
        return (TokenClass::TooShort, cleaned);
    }

    (TokenClass::Keep, cleaned)
}

/// Classify tokens in order, stopping at the first boundary token
pub fn classify_and_truncate(tokens: &[&str]) -> (Vec<String>, StopReason) {
    let mut kept = Vec::new();

    for token in tokens {
        let (class, cleaned) = classify_token(token);
        match class {
            TokenClass::Keep => kept.push(cleaned.to_string()),
            TokenClass::Boundary(reason) => {
                tracing::debug!(token = %token, reason = ?reason, "Title boundary reached");
                return (kept, reason);
            }
            TokenClass::Empty
            | TokenClass::Ignored
            | TokenClass::ChannelNoise
            | TokenClass::TooShort => {
                tracing::trace!(token = %token, class = ?class, "Token dropped");
            }
        }
    }

    (kept, StopReason::Exhausted)
}

/// Remove a known media container extension, if any
pub fn strip_extension(filename: &str) -> &str {
    MEDIA_EXTENSIONS
        .iter()
        .find_map(|ext| {
            let cut = filename.len().checked_sub(ext.len())?;
            let tail = filename.get(cut..)?;
            tail.eq_ignore_ascii_case(ext).then(|| &filename[..cut])
        })
        .unwrap_or(filename)
}

/// Capitalize the first letter of each word and lowercase the rest
pub fn title_case(words: &[String]) -> String {
    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .filter(|w: &String| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title from the tokens before the first standalone year, if any survive
pub fn year_anchored_title(name: &str) -> Option<String> {
    let year = YEAR_IN_NAME.captures(name)?.get(1)?;
    let (kept, _) = classify_and_truncate(&tokenize(&name[..year.start()]));
    if kept.is_empty() {
        None
    } else {
        Some(title_case(&kept))
    }
}

/// Title from classifying the whole name
pub fn general_title(name: &str) -> Option<String> {
    let (kept, _) = classify_and_truncate(&tokenize(name));
    if kept.is_empty() {
        None
    } else {
        Some(title_case(&kept))
    }
}

/// Extract the canonical title from a filename.
///
/// The year-anchored pass runs first; the general pass is the fallback.
/// Returns [`UNKNOWN_TITLE`] when nothing usable remains.
pub fn extract_title(filename: &str) -> String {
    if let Ok(mut cache) = TITLE_CACHE.lock() {
        if let Some(cached) = cache.get(filename) {
            return cached.clone();
        }
    }

    let name = MENTIONS_AND_LINKS.replace_all(strip_extension(filename), " ");
    let title = year_anchored_title(&name)
        .or_else(|| general_title(&name))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    tracing::debug!(filename = %filename, title = %title, "Extracted title");

    if let Ok(mut cache) = TITLE_CACHE.lock() {
        cache.put(filename.to_string(), title.clone());
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Movie.Name_2023-1080p ~ x"),
            vec!["Movie", "Name", "2023", "1080p", "x"]
        );
        assert!(tokenize("...--__").is_empty());
    }

    #[test]
    fn test_rule_priority() {
        // ignore-word beats everything else
        assert_eq!(classify_token("Netflix").0, TokenClass::Ignored);
        // channel noise is substring based
        assert_eq!(classify_token("@TheMoviezHub").0, TokenClass::ChannelNoise);
        assert_eq!(classify_token("(2019)").0, TokenClass::Boundary(StopReason::Year));
        assert_eq!(classify_token("WEBRip").0, TokenClass::Boundary(StopReason::Quality));
        assert_eq!(classify_token("Tam").0, TokenClass::Boundary(StopReason::Language));
        assert_eq!(classify_token("S01").0, TokenClass::Boundary(StopReason::SeriesMarker));
        assert_eq!(classify_token("1.4GB").0, TokenClass::Boundary(StopReason::FileSize));
        assert_eq!(classify_token("--").0, TokenClass::Empty);
        assert_eq!(classify_token("7").0, TokenClass::TooShort);
        assert_eq!(classify_token("V"), (TokenClass::Keep, "V"));
        assert_eq!(classify_token("#Jawan"), (TokenClass::Keep, "Jawan"));
    }

    fn matching_rules(token: &str) -> Vec<TokenClass> {
        let cleaned = clean_token(token);
        let lower = cleaned.to_lowercase();
        RULES
            .iter()
            .filter(|(predicate, _)| predicate(cleaned, &lower))
            .map(|(_, class)| *class)
            .collect()
    }

    #[test]
    fn test_overlapping_rules_first_match_wins() {
        let cases = [
            ("Moviez", TokenClass::Ignored),
            ("Flix", TokenClass::Ignored),
            ("Backup", TokenClass::Ignored),
            ("2023(720p)", TokenClass::Boundary(StopReason::Year)),
        ];
        for (token, expected) in cases {
            let matched = matching_rules(token);
            assert!(matched.len() >= 2, "{token}: {matched:?}");
            assert_eq!(matched[0], expected, "{token}");
            assert_eq!(classify_token(token).0, expected, "{token}");
        }

        // A single letter is kept unless a table claims it first
        assert_eq!(classify_token("h").0, TokenClass::Ignored);
        assert_eq!(classify_token("V").0, TokenClass::Keep);
    }

    #[test]
    fn test_every_noise_fragment_survives_tokenizing() {
        for fragment in CHANNEL_NOISE.iter() {
            let tokens = tokenize(fragment);
            assert_eq!(tokens, vec![*fragment], "{fragment}");
            assert_ne!(classify_token(&format!("The{fragment}Hub")).0, TokenClass::Keep);
        }
        assert_eq!(classify_token("@TheMoviezHub").0, TokenClass::ChannelNoise);
    }

    #[test]
    fn test_truncates_at_first_boundary() {
        let (kept, reason) = classify_and_truncate(&["The", "Great", "720p", "Escape"]);
        assert_eq!(kept, vec!["The", "Great"]);
        assert_eq!(reason, StopReason::Quality);

        let (kept, reason) = classify_and_truncate(&["Gen", "V"]);
        assert_eq!(kept, vec!["Gen", "V"]);
        assert_eq!(reason, StopReason::Exhausted);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("Movie.2023.MKV"), "Movie.2023");
        assert_eq!(strip_extension("Movie Name"), "Movie Name");
        assert_eq!(strip_extension("Movie.Name"), "Movie.Name");
    }

    #[test]
    fn test_title_case() {
        let words = vec!["hELLO".to_string(), "world".to_string(), "v".to_string()];
        assert_eq!(title_case(&words), "Hello World V");
    }

    #[test]
    fn test_year_anchored_title() {
        assert_eq!(
            extract_title("Movie.Name.2023.1080p.WEBRip.Hindi.mkv"),
            "Movie Name"
        );
        assert_eq!(
            extract_title("@TheMoviezHub_Oppenheimer (2023) [Hin+Eng] 720p.mkv"),
            "Oppenheimer"
        );
    }

    #[test]
    fn test_year_and_everything_after_excluded() {
        let title = extract_title("Blade.Runner.1982.Final.Cut.mkv");
        assert_eq!(title, "Blade Runner");
        assert!(!title.contains("1982"));
        assert!(!title.contains("Final"));
    }

    #[test]
    fn test_falls_back_when_nothing_precedes_year() {
        assert_eq!(extract_title("2012.mkv"), UNKNOWN_TITLE);
        assert_eq!(year_anchored_title("Netflix.2019.Gen.V"), None);
        assert_eq!(general_title("Netflix.Gen.V.S01"), Some("Gen V".to_string()));
    }

    #[test]
    fn test_general_path_without_year() {
        assert_eq!(extract_title("Show.Name.S01E05.720p.mkv"), "Show Name");
        assert_eq!(extract_title("Jawan Hindi HDRip 1.4GB.mp4"), "Jawan");
        assert_eq!(extract_title("___.mkv"), UNKNOWN_TITLE);
    }

    #[test]
    fn test_mentions_and_links_removed() {
        assert_eq!(extract_title("@Channel www.site.com Leo 2023.mkv"), "Leo");
    }
}
