use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;

use crate::db::{KeyValueStore, StoreKey};
use crate::error::AppResult;

/// Creates a Redis client for session storage
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed durable session store
///
/// Every write is awaited before the call returns, so a read issued after a
/// write sees it and nothing is left queued when the process stops.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects once; the manager reconnects on its own after failures
    pub async fn new(redis_client: Client) -> AppResult<Self> {
        let conn = ConnectionManager::new(redis_client).await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key.to_string()).await?;
        Ok(value)
    }

    async fn set(&self, key: StoreKey, value: String) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key.to_string(), value).await?;
        tracing::debug!(key = %key, "Session slot written");
        Ok(())
    }

    async fn remove(&self, keys: &[StoreKey]) -> AppResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let _: () = conn.del(keys).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

// These tests need a running Redis server: REDIS_URL=... cargo test -- --ignored

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SessionStore;
    use std::sync::Arc;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    async fn connect() -> RedisStore {
        let client = create_redis_client(&redis_url()).unwrap();
        RedisStore::new(client).await.unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn test_set_is_visible_to_the_next_read() {
        let store = connect().await;

        store
            .set(StoreKey::SkippedIds, "[\"p1\",\"p2\"]".to_string())
            .await
            .unwrap();

        let value = store.get(StoreKey::SkippedIds).await.unwrap();
        assert_eq!(value.as_deref(), Some("[\"p1\",\"p2\"]"));

        store.remove(&[StoreKey::SkippedIds]).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_remove_after_set_is_applied_in_order() {
        let store = connect().await;

        store
            .set(StoreKey::LikedPapers, "[]".to_string())
            .await
            .unwrap();
        store.remove(&StoreKey::SESSION).await.unwrap();

        assert_eq!(store.get(StoreKey::LikedPapers).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_show_history_reads_back_after_save() {
        let store = connect().await;
        let session = SessionStore::new(Arc::new(store.clone()));

        session.save_show_history(true).await;
        assert!(session.preferences().await.show_history);

        session.save_show_history(false).await;
        assert!(!session.preferences().await.show_history);

        store.remove(&[StoreKey::ShowHistory]).await.unwrap();
    }
}
