//! Poster lookup for new posts.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Posters wider than this are scaled down
const MAX_WIDTH: u32 = 500;
const MAX_HEIGHT: u32 = 750;
const JPEG_QUALITY: u8 = 85;

lazy_static! {
    static ref SEARCH_YEAR: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
    static ref SEARCH_QUALITY: Regex =
        Regex::new(r"(?i)\b(?:720p|1080p|480p|HDRip|BluRay|WEBRip|CAM|TS|TC)\b").unwrap();
    static ref SEARCH_SIZE: Regex = Regex::new(r"(?i)\b\d+(?:\.\d+)?(?:GB|MB)\b").unwrap();
    static ref SEARCH_BRACKETS: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref SEARCH_SEPARATORS: Regex = Regex::new(r"[._\-]+").unwrap();
    static ref SEARCH_SPACES: Regex = Regex::new(r"\s+").unwrap();
}

/// Source of poster images. Never errors; `None` means no poster.
#[async_trait]
pub trait PosterSource: Send + Sync {
    async fn fetch(&self, title: &str, year: Option<&str>, is_series: bool) -> Option<Vec<u8>>;
}

/// Used when no TMDB key is configured
pub struct NoPosterSource;

#[async_trait]
impl PosterSource for NoPosterSource {
    async fn fetch(&self, _title: &str, _year: Option<&str>, _is_series: bool) -> Option<Vec<u8>> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    poster_path: Option<String>,
}

/// TMDB search + poster download
pub struct TmdbPosterSource {
    http: Client,
    api_key: String,
    api_url: String,
    image_url: String,
}

impl TmdbPosterSource {
    pub fn new(
        api_key: &str,
        api_url: &str,
        image_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, query: &str, year: Option<&str>, is_series: bool) -> Result<Option<String>, reqwest::Error> {
        let (endpoint, year_param) = if is_series {
            ("search/tv", "first_air_date_year")
        } else {
            ("search/movie", "year")
        };

        let mut params = vec![
            ("api_key", self.api_key.as_str()),
            ("query", query),
            ("language", "en-US"),
        ];
        if let Some(year) = year {
            params.push((year_param, year));
        }

        let response: SearchResponse = self
            .http
            .get(format!("{}/{}", self.api_url, endpoint))
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .results
            .into_iter()
            .next()
            .and_then(|result| result.poster_path))
    }

    async fn download(&self, poster_path: &str) -> Result<Vec<u8>, reqwest::Error> {
        let bytes = self
            .http
            .get(format!("{}{}", self.image_url, poster_path))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PosterSource for TmdbPosterSource {
    async fn fetch(&self, title: &str, year: Option<&str>, is_series: bool) -> Option<Vec<u8>> {
        let query = search_query(title);
        if query.is_empty() {
            tracing::warn!(title = %title, "Empty poster search term");
            return None;
        }

        let poster_path = match self.search(&query, year, is_series).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::info!(title = %title, query = %query, "No poster found");
                return None;
            }
            Err(e) => {
                // the URL carries the API key
                tracing::warn!(title = %title, "Poster search failed: {}", e.without_url());
                return None;
            }
        };

        match self.download(&poster_path).await {
            Ok(raw) => {
                tracing::info!(title = %title, bytes = raw.len(), "Downloaded poster");
                Some(optimize(raw))
            }
            Err(e) => {
                tracing::warn!(title = %title, "Poster download failed: {}", e.without_url());
                None
            }
        }
    }
}

/// Strip years, quality and size tags, bracketed text and separators
pub fn search_query(title: &str) -> String {
    let cleaned = SEARCH_YEAR.replace_all(title.trim(), "");
    let cleaned = SEARCH_QUALITY.replace_all(&cleaned, "");
    let cleaned = SEARCH_SIZE.replace_all(&cleaned, "");
    let cleaned = SEARCH_BRACKETS.replace_all(&cleaned, "");
    let cleaned = SEARCH_SEPARATORS.replace_all(&cleaned, " ");
    SEARCH_SPACES.replace_all(&cleaned, " ").trim().to_string()
}

/// Fit within 500x750 when wider than 500 px and re-encode as JPEG.
/// Falls back to the original bytes if decoding or encoding fails.
pub fn optimize(raw: Vec<u8>) -> Vec<u8> {
    match reencode(&raw) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            tracing::warn!("Poster re-encode failed, using original: {}", e);
            raw
        }
    }
}

fn reencode(raw: &[u8]) -> image::ImageResult<Vec<u8>> {
    let mut img = image::load_from_memory(raw)?;
    if img.width() > MAX_WIDTH {
        img = img.thumbnail(MAX_WIDTH, MAX_HEIGHT);
    }

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
    Ok(jpeg)
}
