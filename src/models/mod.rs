mod legacy;
mod media;
mod status;

pub use media::{
    ContentTag, DuplicateReason, FileRecord, IngestEvent, MediaMetadata, MovieAggregate,
    PersistedRecord, NOT_AVAILABLE, UNKNOWN_TITLE,
};
pub use status::{BotStatus, MovieSummary, StatusResponse};
