//! Process-wide Prometheus metrics, exported by `GET /metrics`.

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, register_int_gauge};
use prometheus::{IntCounter, IntCounterVec, IntGauge};

lazy_static! {
    pub static ref FILES_INGESTED: IntCounter = register_int_counter!(
        "movie_bot_files_ingested_total",
        "Files added to an aggregate"
    )
    .unwrap();

    pub static ref DUPLICATES_SKIPPED: IntCounter = register_int_counter!(
        "movie_bot_duplicate_files_total",
        "Files skipped because the aggregate already holds them"
    )
    .unwrap();

    /// Labelled by outcome: sent, edited, failed
    pub static ref POSTS: IntCounterVec = register_int_counter_vec!(
        "movie_bot_posts_total",
        "Update channel publish attempts",
        &["outcome"]
    )
    .unwrap();

    /// Labelled by result: hit, miss
    pub static ref POSTER_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "movie_bot_poster_lookups_total",
        "Poster fetch attempts",
        &["result"]
    )
    .unwrap();

    pub static ref AGGREGATES_EVICTED: IntCounter = register_int_counter!(
        "movie_bot_aggregates_evicted_total",
        "Aggregates removed by the retention sweep"
    )
    .unwrap();

    pub static ref TRACKED_AGGREGATES: IntGauge = register_int_gauge!(
        "movie_bot_tracked_aggregates",
        "Aggregates currently held in memory"
    )
    .unwrap();
}

pub fn post_sent() {
    POSTS.with_label_values(&["sent"]).inc();
}

pub fn post_edited() {
    POSTS.with_label_values(&["edited"]).inc();
}

pub fn post_failed() {
    POSTS.with_label_values(&["failed"]).inc();
}

pub fn poster_lookup(found: bool) {
    let label = if found { "hit" } else { "miss" };
    POSTER_LOOKUPS.with_label_values(&[label]).inc();
}
