use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{KeyValueStore, StoreKey};
use crate::models::{Paper, SessionState};

/// UI preferences kept next to the session history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preferences {
    pub selected_field: Option<String>,
    pub show_history: bool,
}

/// Durable persistence of the feedback history
///
/// Storage failures never reach the caller: a slot that cannot be read or
/// decoded restores as empty, and failed writes are logged. Writes are
/// ignored until `restore` has run once so empty defaults can never
/// overwrite history that has not been loaded yet.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    restored: Arc<AtomicBool>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            restored: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_restored(&self) -> bool {
        self.restored.load(Ordering::Acquire)
    }

    /// Reads the three session collections once
    pub async fn restore(&self) -> SessionState {
        let liked: Vec<Paper> = self.load_slot(StoreKey::LikedPapers).await;
        let disliked: Vec<Paper> = self.load_slot(StoreKey::DislikedPapers).await;
        let skipped: Vec<String> = self.load_slot(StoreKey::SkippedIds).await;

        tracing::info!(
            backend = self.backend.name(),
            liked = liked.len(),
            disliked = disliked.len(),
            skipped = skipped.len(),
            "Restored session history"
        );

        self.restored.store(true, Ordering::Release);
        SessionState::new(liked, disliked, skipped)
    }

    async fn load_slot<T: DeserializeOwned + Default>(&self, key: StoreKey) -> T {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read session slot");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "Malformed session slot, treating as empty");
            T::default()
        })
    }

    /// Writes one collection as JSON
    pub async fn persist<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        if !self.is_restored() {
            tracing::debug!(key = %key, "Skipping persist before restore");
            return;
        }

        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Session serialization error");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, json).await {
            tracing::error!(key = %key, error = %e, "Failed to persist session slot");
        }
    }

    /// Writes whichever session collection `key` names
    pub async fn persist_slot(&self, key: StoreKey, session: &SessionState) {
        match key {
            StoreKey::LikedPapers => self.persist(key, &session.liked).await,
            StoreKey::DislikedPapers => self.persist(key, &session.disliked).await,
            StoreKey::SkippedIds => self.persist(key, &session.skipped).await,
            StoreKey::SelectedField | StoreKey::ShowHistory => {
                tracing::debug!(key = %key, "Not a session slot");
            }
        }
    }

    /// Removes the feedback history; preferences are kept
    pub async fn clear(&self) {
        if let Err(e) = self.backend.remove(&StoreKey::SESSION).await {
            tracing::error!(error = %e, "Failed to clear session history");
        }
    }

    pub async fn preferences(&self) -> Preferences {
        let selected_field = match self.backend.get(StoreKey::SelectedField).await {
            Ok(value) => value.filter(|f| !f.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read selected field");
                None
            }
        };

        let show_history = match self.backend.get(StoreKey::ShowHistory).await {
            Ok(Some(raw)) => serde_json::from_str::<Option<bool>>(&raw)
                .ok()
                .flatten()
                .unwrap_or(false),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read history visibility");
                false
            }
        };

        Preferences {
            selected_field,
            show_history,
        }
    }

    /// Stores the topic filter as a raw string; `None` stores an empty one
    pub async fn save_selected_field(&self, field: Option<&str>) {
        let value = field.unwrap_or_default().to_string();
        if let Err(e) = self.backend.set(StoreKey::SelectedField, value).await {
            tracing::error!(error = %e, "Failed to persist selected field");
        }
    }

    pub async fn save_show_history(&self, show: bool) {
        if let Err(e) = self
            .backend
            .set(StoreKey::ShowHistory, show.to_string())
            .await
        {
            tracing::error!(error = %e, "Failed to persist history visibility");
        }
    }

    /// Approximate size of everything this store holds, in KiB
    pub async fn usage_kb(&self) -> f64 {
        let mut total = 0usize;
        for key in StoreKey::ALL {
            if let Ok(Some(value)) = self.backend.get(key).await {
                total += key.to_string().len() + value.len();
            }
        }
        (total as f64 / 1024.0 * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Feedback;

    fn store_with(backend: &MemoryStore) -> SessionStore {
        SessionStore::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn test_restore_empty_backend() {
        let store = store_with(&MemoryStore::new());
        let session = store.restore().await;
        assert!(session.is_empty());
        assert!(store.is_restored());
    }

    #[tokio::test]
    async fn test_persist_ignored_before_restore() {
        let backend = MemoryStore::new();
        let store = store_with(&backend);

        store
            .persist(StoreKey::SkippedIds, &vec!["p1".to_string()])
            .await;

        assert_eq!(backend.len().await, 0);
    }

    #[tokio::test]
    async fn test_liked_order_survives_restore() {
        let backend = MemoryStore::new();
        let store = store_with(&backend);
        let mut session = store.restore().await;

        for id in ["p1", "p2"] {
            let key = session.record(Feedback::Like, &Paper::new(id)).unwrap();
            store.persist_slot(key, &session).await;
        }

        let fresh = store_with(&backend).restore().await;
        assert_eq!(fresh.liked_ids(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_malformed_slot_restores_empty_without_touching_others() {
        let backend = MemoryStore::new();
        backend
            .set(StoreKey::LikedPapers, "{not json".to_string())
            .await
            .unwrap();
        backend
            .set(StoreKey::SkippedIds, "[\"p9\"]".to_string())
            .await
            .unwrap();
        backend
            .set(StoreKey::DislikedPapers, "{\"paperId\":\"p1\"}".to_string())
            .await
            .unwrap();

        let session = store_with(&backend).restore().await;
        assert!(session.liked.is_empty());
        assert!(session.disliked.is_empty());
        assert_eq!(session.skipped, vec!["p9"]);
    }

    #[tokio::test]
    async fn test_clear_keeps_preferences() {
        let backend = MemoryStore::new();
        let store = store_with(&backend);
        let mut session = store.restore().await;

        let key = session
            .record(Feedback::Dislike, &Paper::new("p1"))
            .unwrap();
        store.persist_slot(key, &session).await;
        store.save_selected_field(Some("Physics")).await;

        store.clear().await;

        for key in StoreKey::SESSION {
            assert_eq!(backend.get(key).await.unwrap(), None);
        }
        assert_eq!(
            store.preferences().await.selected_field.as_deref(),
            Some("Physics")
        );
    }

    #[tokio::test]
    async fn test_preferences_defaults_and_round_trip() {
        let backend = MemoryStore::new();
        let store = store_with(&backend);
        assert_eq!(store.preferences().await, Preferences::default());

        store.save_selected_field(Some("Biology")).await;
        store.save_show_history(true).await;

        let prefs = store.preferences().await;
        assert_eq!(prefs.selected_field.as_deref(), Some("Biology"));
        assert!(prefs.show_history);

        store.save_selected_field(None).await;
        assert_eq!(store.preferences().await.selected_field, None);
    }

    #[tokio::test]
    async fn test_malformed_show_history_is_false() {
        let backend = MemoryStore::new();
        backend
            .set(StoreKey::ShowHistory, "maybe".to_string())
            .await
            .unwrap();
        assert!(!store_with(&backend).preferences().await.show_history);
    }

    #[tokio::test]
    async fn test_usage_kb_counts_keys_and_values() {
        let backend = MemoryStore::new();
        backend
            .set(StoreKey::SkippedIds, "x".repeat(1024 - "skippedIds".len()))
            .await
            .unwrap();

        assert_eq!(store_with(&backend).usage_kb().await, 1.0);
    }
}
