use std::fmt::Display;

use crate::error::AppResult;

/// Durable keys used by the session store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    LikedPapers,
    DislikedPapers,
    SkippedIds,
    SelectedField,
    ShowHistory,
}

impl StoreKey {
    /// Keys holding feedback history; cleared by a session reset
    pub const SESSION: [StoreKey; 3] = [
        StoreKey::LikedPapers,
        StoreKey::DislikedPapers,
        StoreKey::SkippedIds,
    ];

    pub const ALL: [StoreKey; 5] = [
        StoreKey::LikedPapers,
        StoreKey::DislikedPapers,
        StoreKey::SkippedIds,
        StoreKey::SelectedField,
        StoreKey::ShowHistory,
    ];
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreKey::LikedPapers => write!(f, "likedPapers"),
            StoreKey::DislikedPapers => write!(f, "dislikedPapers"),
            StoreKey::SkippedIds => write!(f, "skippedIds"),
            StoreKey::SelectedField => write!(f, "selectedField"),
            StoreKey::ShowHistory => write!(f, "showHistory"),
        }
    }
}

/// String key/value storage that survives process restarts
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> AppResult<Option<String>>;

    async fn set(&self, key: StoreKey, value: String) -> AppResult<()>;

    async fn remove(&self, keys: &[StoreKey]) -> AppResult<()>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
