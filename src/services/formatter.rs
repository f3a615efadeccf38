//! Rendering of the update channel summary post.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{MovieAggregate, NOT_AVAILABLE};

/// Caption of the inline button under every post
pub const GET_FILE_BUTTON: &str = "🎬 ɢᴇᴛ ꜰɪʟᴇ";

/// Deep link start parameter prefix
pub const GET_FILE_PREFIX: &str = "getfile-";

lazy_static! {
    static ref SLUG_STRIP: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SLUG_SPACES: Regex = Regex::new(r"\s+").unwrap();
}

/// `Movie: Name!` -> `Movie-Name`
pub fn slug(title: &str) -> String {
    let stripped = SLUG_STRIP.replace_all(title, "");
    SLUG_SPACES.replace_all(stripped.trim(), "-").into_owned()
}

/// Inverse of [`slug`] as far as possible: hyphens become spaces
pub fn unslug(slug: &str) -> String {
    slug.replace('-', " ").trim().to_string()
}

/// `https://t.me/<bot>?start=getfile-<slug>`
pub fn deep_link(bot_username: &str, title: &str) -> String {
    format!(
        "https://t.me/{}?start={}{}",
        bot_username.trim_start_matches('@'),
        GET_FILE_PREFIX,
        slug(title)
    )
}

/// Escape text for Telegram HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Collapse episode tokens into compact ranges.
///
/// Numeric tokens are sorted and consecutive runs joined (`1,2,3,5` ->
/// `1-3, 5`). Tokens that are already ranges, or not numeric, follow in
/// order of their leading number.
pub fn collapse_episodes<'a, I>(episodes: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut singles: Vec<u32> = Vec::new();
    let mut preformed: Vec<&str> = Vec::new();

    for episode in episodes {
        match episode.trim().parse::<u32>() {
            Ok(n) if !episode.contains('-') => singles.push(n),
            _ => preformed.push(episode.as_str()),
        }
    }

    singles.sort_unstable();
    singles.dedup();

    let mut parts: Vec<String> = Vec::new();
    let mut run: Option<(u32, u32)> = None;
    for n in singles {
        run = match run {
            Some((start, end)) if n == end + 1 => Some((start, n)),
            Some(done) => {
                parts.push(format_run(done));
                Some((n, n))
            }
            None => Some((n, n)),
        };
    }
    if let Some(done) = run {
        parts.push(format_run(done));
    }

    preformed.sort_by_key(|token| leading_number(token));
    parts.extend(preformed.into_iter().map(str::to_string));

    parts.join(", ")
}

fn format_run((start, end): (u32, u32)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

fn leading_number(token: &str) -> u32 {
    token
        .split('-')
        .next()
        .and_then(|start| start.trim().parse().ok())
        .unwrap_or(u32::MAX)
}

fn join_or_na<'a, I>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let joined = values
        .into_iter()
        .filter(|v| !v.is_empty() && v.as_str() != NOT_AVAILABLE)
        .map(|v| escape_html(v))
        .collect::<Vec<_>>()
        .join(separator);
    if joined.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        joined
    }
}

/// Render the HTML summary for an aggregate
pub fn render(aggregate: &MovieAggregate) -> String {
    let title = escape_html(&aggregate.title);
    let quality = join_or_na(&aggregate.qualities, ", ");
    let language = join_or_na(&aggregate.languages, ", ");
    let year = aggregate
        .year()
        .map(escape_html)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let file_sizes = join_or_na(aggregate.files.iter().map(|f| &f.size_display), " | ");

    let mut message = format!(
        "✨ ᴛɪᴛʟᴇ : <code>{title}</code>\n\
         🎞️ ǫᴜᴀʟɪᴛʏ : <b>{quality}</b>\n\
         🎧 ᴀᴜᴅɪᴏ : <b>{language}</b>\n\
         📅 ʏᴇᴀʀ : <b>{year}</b>\n\
         📊 ꜰɪʟᴇ ꜱɪᴢᴇ : <b>{file_sizes}</b>\n"
    );

    if aggregate.is_series() && !aggregate.episodes_by_season.is_empty() {
        let lines = aggregate
            .episodes_by_season
            .iter()
            .map(|(season, episodes)| {
                format!("<b>S{}:</b> {}", season, escape_html(&collapse_episodes(episodes)))
            })
            .collect::<Vec<_>>()
            .join("\n");
        message.push_str("📺 ᴇᴘɪꜱᴏᴅᴇꜱ : \n");
        message.push_str(&lines);
        message.push('\n');
    }

    message.push_str(&format!(
        "\n📁 ᴛᴏᴛᴀʟ ꜰɪʟᴇꜱ : <b>{}</b>",
        aggregate.file_count()
    ));
    message
}
