//! Static word tables and compiled matchers shared by the tokenizer and
//! the metadata extractor.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Characters stripped from the front of every token before classification
pub const TOKEN_LEAD_CHARS: &[char] = &['@', '#', '~', '-', '_', '(', ')'];

/// Video container extensions accepted from the database channel
pub const SUPPORTED_FORMATS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"];

/// Extensions stripped from a filename before title extraction
pub const MEDIA_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".mpg", ".mpeg", ".3gp",
    ".ts",
];

/// Resolutions accepted by the standalone resolution scan
pub const KNOWN_RESOLUTIONS: &[&str] = &["360", "480", "720", "1080", "2160"];

lazy_static! {
    // ============ WORD TABLES ============

    /// Channel branding, release noise and genre words. Always dropped.
    pub static ref IGNORE_WORDS: HashSet<&'static str> = [
        "rarbg", "dub", "sub", "sample", "mkv", "aac", "combined",
        "action", "adventure", "animation", "biography", "comedy", "crime",
        "documentary", "drama", "family", "fantasy", "film-noir", "history",
        "horror", "music", "musical", "mystery", "romance", "sci-fi", "sport",
        "thriller", "war", "western",
        "nf", "netflix", "sonyliv", "sony", "sliv", "amzn", "prime",
        "primevideo", "hotstar", "zee5", "jio", "jhs", "aha", "hbo", "paramount",
        "apple", "hoichoi", "sunnxt", "viki", "rm_movie_flix", "rm", "flix",
        "hq", "jnk_backup", "jnk", "backup", "dd", "moviez", "shetty", "moviez2",
        "thedd", "snxt", "h", "264", "aac2", "0", "adda", "addafiles", "files",
    ]
    .into_iter()
    .collect();

    /// Fragments of uploader channel names; a token containing one is noise
    pub static ref CHANNEL_NOISE: Vec<&'static str> = vec![
        "moviez", "flix", "backup", "addafiles",
    ];

    /// Language codes and names, lowercase → display name
    pub static ref LANGUAGES: HashMap<&'static str, &'static str> = [
        ("hin", "Hindi"), ("hindi", "Hindi"),
        ("tam", "Tamil"), ("tamil", "Tamil"),
        ("kan", "Kannada"), ("kannada", "Kannada"),
        ("tel", "Telugu"), ("telugu", "Telugu"),
        ("mal", "Malayalam"), ("malayalam", "Malayalam"),
        ("eng", "English"), ("english", "English"),
        ("pun", "Punjabi"), ("punjabi", "Punjabi"),
        ("ben", "Bengali"), ("bengali", "Bengali"),
        ("mar", "Marathi"), ("marathi", "Marathi"),
        ("guj", "Gujarati"), ("gujarati", "Gujarati"),
        ("urd", "Urdu"), ("urdu", "Urdu"),
        ("kor", "Korean"), ("korean", "Korean"),
        ("jpn", "Japanese"), ("japanese", "Japanese"),
    ]
    .into_iter()
    .collect();

    /// Audio/subtitle descriptors that only count in the filename token scan
    pub static ref AUDIO_DESCRIPTORS: HashMap<&'static str, &'static str> = [
        ("dual", "Dual Audio"),
        ("multi", "Multi Audio"),
        ("dubbed", "Dubbed"),
        ("org", "Original"),
        ("original", "Original"),
        ("sub", "Subtitled"),
        ("esub", "English Sub"),
        ("msub", "Multi Sub"),
    ]
    .into_iter()
    .collect();

    /// Quality tokens, lowercase → display form
    pub static ref QUALITY_TOKENS: HashMap<&'static str, &'static str> = [
        ("hdcam", "HDCAM"), ("hdtc", "HDTC"), ("camrip", "CAMRip"), ("cam", "CAM"),
        ("ts", "TS"), ("tc", "TC"), ("telesync", "TeleSync"),
        ("dvdscr", "DVDScr"), ("dvdrip", "DVDRip"), ("predvd", "PreDVD"),
        ("webrip", "WEBRip"), ("webdl", "WEB-DL"), ("web", "WEB"),
        ("tvrip", "TVRip"), ("hdtv", "HDTV"), ("bluray", "BluRay"), ("brrip", "BRRip"),
        ("bdrip", "BDRip"), ("hevc", "HEVC"), ("hdrip", "HDRip"),
        ("360p", "360p"), ("480p", "480p"), ("720p", "720p"), ("1080p", "1080p"),
        ("2160p", "2160p"), ("4k", "4K"), ("1440p", "1440p"), ("540p", "540p"),
        ("240p", "240p"), ("140p", "140p"), ("uhd", "UHD"), ("fhd", "FHD"), ("hd", "HD"),
    ]
    .into_iter()
    .collect();

    // ============ TOKEN MATCHERS ============

    /// A token that begins with a 4-digit 19xx/20xx year not followed by
    /// another alphanumeric
    pub static ref YEAR_TOKEN: Regex =
        Regex::new(r"^(?:19|20)\d{2}(?:$|[^A-Za-z0-9])").unwrap();

    pub static ref QUALITY_TOKEN: Regex = Regex::new(
        r"(?i)\b(?:HDCam|HDTC|CamRip|TS|TC|TeleSync|DVDScr|DVDRip|PreDVD|WEBRip|WEB-DL|TVRip|HDTV|WEB DL|WebDl|BluRay|BRRip|BDRip|360p|480p|720p|1080p|2160p|4K|1440p|540p|240p|140p|HEVC|HDRip)\b"
    )
    .unwrap();

    pub static ref SERIES_MARKER_TOKEN: Regex =
        Regex::new(r"(?i)^(?:s\d{1,2}(?:e\d{1,3})?|season|episode|ep\d{0,3}|part)$").unwrap();

    pub static ref FILE_SIZE_TOKEN: Regex = Regex::new(r"(?i)^\d+(?:\.\d+)?(?:gb|mb)$").unwrap();

    // ============ WHOLE-NAME MATCHERS ============

    /// Year anywhere in a name, not adjacent to other alphanumerics.
    /// Group 1 is the year itself.
    pub static ref YEAR_IN_NAME: Regex =
        Regex::new(r"(?:^|[^A-Za-z0-9])((?:19|20)\d{2})(?:$|[^A-Za-z0-9])").unwrap();

    pub static ref TOKEN_SPLIT: Regex = Regex::new(r"[\s\-_.~]+").unwrap();

    /// `@channel` mentions and bare `www.` links
    pub static ref MENTIONS_AND_LINKS: Regex =
        Regex::new(r#"@[^ \n\r\t.,:;!?()\[\]{}<>\\/"'=_%]+|\bwww\.[^\s\])]+"#).unwrap();

    pub static ref RESOLUTION: Regex = Regex::new(r"(?i)\b(\d{3,4})p?\b").unwrap();

    pub static ref BRACKET_CONTENT: Regex = Regex::new(r"\[([^\]]+)\]").unwrap();

    pub static ref BRACKET_SPLIT: Regex = Regex::new(r"\s*\+\s*").unwrap();

    pub static ref HASHTAG: Regex = Regex::new(r"#(\w+)").unwrap();

    /// Full language names, matched anywhere in a word (`HindiDubbed`)
    pub static ref LANGUAGE_NAME: Regex = Regex::new(
        r"(?i)(Tamil|Hindi|English|Telugu|Malayalam|Kannada|Bengali|Marathi|Gujarati|Punjabi|Urdu|Korean|Japanese)"
    )
    .unwrap();

    // ============ SEASON / EPISODE (priority order) ============

    /// `EP12-15`, `Episode 3 - 4`
    pub static ref EPISODE_RANGE: Regex =
        Regex::new(r"(?i)\b(?:EP|Episode)[\s._]*0*(\d{1,3})\s*-\s*0*(\d{1,3})\b").unwrap();

    /// `S01E01_to_E10`, `S01 EP01_to_10`
    pub static ref SEASON_RANGE: Regex = Regex::new(
        r"(?i)(?:^|[^A-Za-z0-9])S(\d{1,2})[^\w\n\r]*E(?:p(?:isode)?)?0*(\d{1,3})_to_E?(?:p(?:isode)?)?0*(\d{1,3})"
    )
    .unwrap();

    /// `S01E05`, `S1 EP05`, `S02.Episode.10`
    pub static ref SEASON_EPISODE: Regex =
        Regex::new(r"(?i)(?:^|[^A-Za-z0-9])S(\d{1,2})[^\w\n\r]*E(?:p(?:isode)?)?[\s.]*0*(\d{1,3})").unwrap();

    /// `Season 1 Episode 5`, `Season.02.Ep.7`
    pub static ref NAMED_SEASON_EPISODE: Regex =
        Regex::new(r"(?i)Season[\s._]*0*(\d{1,2})[\s._\-,:]*Ep(?:isode)?[\s._]*0*(\d{1,3})").unwrap();

    // ============ SERIES TITLE CLEANUP ============

    pub static ref TRAILING_SEASON_EPISODE: Regex = Regex::new(r"(?i)\s*\bS\d{1,2}E\d{1,3}.*$").unwrap();
    pub static ref TRAILING_SEASON: Regex = Regex::new(r"(?i)\s*\bSeason\s*\d+.*$").unwrap();
    pub static ref TRAILING_EPISODE: Regex = Regex::new(r"(?i)\s*\b(?:Episode|Ep)\s*\d+.*$").unwrap();
}

/// Strip the leading noise characters of a raw token
pub fn clean_token(token: &str) -> &str {
    token.trim_start_matches(TOKEN_LEAD_CHARS)
}

/// Strip noise characters on both ends, for table lookups
pub fn trim_token(token: &str) -> &str {
    token.trim_matches(TOKEN_LEAD_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_token() {
        assert!(YEAR_TOKEN.is_match("2023"));
        assert!(YEAR_TOKEN.is_match("1999)"));
        assert!(!YEAR_TOKEN.is_match("20234"));
        assert!(!YEAR_TOKEN.is_match("2023p"));
        assert!(!YEAR_TOKEN.is_match("1800"));
    }

    #[test]
    fn test_year_in_name_requires_separation() {
        let caps = YEAR_IN_NAME.captures("Movie.Name.2023.1080p").unwrap();
        assert_eq!(caps.get(1).unwrap().as_str(), "2023");
        assert!(YEAR_IN_NAME.captures("Blade2049Runner").is_none());
        assert!(YEAR_IN_NAME.captures("x2000").is_none());
    }

    #[test]
    fn test_series_marker_token() {
        for token in ["S01", "s1", "S02E03", "Season", "EP", "Ep12", "part"] {
            assert!(SERIES_MARKER_TOKEN.is_match(token), "{token}");
        }
        assert!(!SERIES_MARKER_TOKEN.is_match("Spider"));
        assert!(!SERIES_MARKER_TOKEN.is_match("Parts"));
    }

    #[test]
    fn test_file_size_token() {
        assert!(FILE_SIZE_TOKEN.is_match("1.4GB"));
        assert!(FILE_SIZE_TOKEN.is_match("700mb"));
        assert!(!FILE_SIZE_TOKEN.is_match("GB"));
    }

    #[test]
    fn test_language_name_inside_words() {
        let found: Vec<&str> = LANGUAGE_NAME
            .find_iter("#TamilMovie HindiDubbed")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["Tamil", "Hindi"]);
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("@#Name"), "Name");
        assert_eq!(clean_token("(2023)"), "2023)");
        assert_eq!(trim_token("(2023)"), "2023");
        assert_eq!(clean_token("--"), "");
    }
}
