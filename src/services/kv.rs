use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Flat string key-value store backing the movie repository
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> Result<()>;

    /// All entries whose key starts with `prefix`, in no particular order
    async fn get_all_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn ping(&self) -> Result<bool>;

    /// Short backend name for health output
    fn backend(&self) -> &'static str;
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    /// Connect with an auto-reconnecting connection manager
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn get_all_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);

        // SCAN instead of KEYS so a large keyspace does not block the server
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            // A key can vanish between SCAN and GET
            let value: Option<String> = conn.get(&key).await?;
            if let Some(value) = value {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// In-process store, used without a Redis URL and in tests.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_all_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_prefix_listing() {
        let store = MemoryKvStore::new();
        store.put("movie_Leo", "1".to_string()).await.unwrap();
        store.put("movie_Jawan", "2".to_string()).await.unwrap();
        store.put("other", "3".to_string()).await.unwrap();

        let mut found = store.get_all_with_prefix("movie_").await.unwrap();
        found.sort();
        assert_eq!(
            found,
            vec![
                ("movie_Jawan".to_string(), "2".to_string()),
                ("movie_Leo".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_delete_and_overwrite() {
        let store = MemoryKvStore::new();
        store.put("movie_Leo", "old".to_string()).await.unwrap();
        store.put("movie_Leo", "new".to_string()).await.unwrap();
        assert_eq!(store.get("movie_Leo").await.as_deref(), Some("new"));

        store.delete("movie_Leo").await.unwrap();
        store.delete("movie_Missing").await.unwrap();
        assert_eq!(store.len().await, 0);
        assert!(store.ping().await.unwrap());
    }
}
