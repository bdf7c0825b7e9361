use std::sync::Mutex;

use tokio::sync::Notify;

use super::{KeyValueStore, MemoryStore, StoreKey};
use crate::error::AppResult;

/// Store operation that `GatedStore` can hold open
///
/// A held read has already read its value; a held write has not written yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Held {
    Get(StoreKey),
    Set(StoreKey),
}

/// In-memory store that parks one chosen operation until `open` is called
///
/// Lets tests interleave work with a request that is stuck inside the store.
#[derive(Default)]
pub(crate) struct GatedStore {
    inner: MemoryStore,
    held: Mutex<Option<Held>>,
    entered: Notify,
    gate: Notify,
}

impl GatedStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Parks the next matching operation
    pub(crate) fn hold(&self, op: Held) {
        *self.held.lock().unwrap() = Some(op);
    }

    /// Resolves once the held operation is parked
    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Lets the parked operation continue
    pub(crate) fn open(&self) {
        self.gate.notify_one();
    }

    async fn pause_if(&self, op: Held) {
        let hit = {
            let mut held = self.held.lock().unwrap();
            if *held == Some(op) {
                *held = None;
                true
            } else {
                false
            }
        };

        if hit {
            self.entered.notify_one();
            self.gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>> {
        let value = self.inner.get(key).await;
        self.pause_if(Held::Get(key)).await;
        value
    }

    async fn set(&self, key: StoreKey, value: String) -> AppResult<()> {
        self.pause_if(Held::Set(key)).await;
        self.inner.set(key, value).await
    }

    async fn remove(&self, keys: &[StoreKey]) -> AppResult<()> {
        self.inner.remove(keys).await
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
