pub mod cleanup;
pub mod debounce;
pub mod extractor;
pub mod formatter;
pub mod kv;
pub mod metrics;
pub mod patterns;
pub mod poster;
pub mod processor;
pub mod publisher;
pub mod repository;
pub mod store;
pub mod telegram;
pub mod tokenizer;

#[cfg(test)]
pub mod testing;

pub use cleanup::{start_cleanup_task, CleanupConfig};
pub use kv::{KvStore, MemoryKvStore, RedisKvStore};
pub use poster::{NoPosterSource, PosterSource, TmdbPosterSource};
pub use processor::MovieProcessor;
pub use publisher::Publisher;
pub use repository::MovieRepository;
pub use store::AggregateStore;
pub use telegram::{Messenger, TelegramClient, UpdatePoller};
