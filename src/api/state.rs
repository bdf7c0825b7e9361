use std::sync::Arc;
use std::time::Duration;

use crate::db::{KeyValueStore, SessionStore};
use crate::services::{
    FallbackSource, FeedbackRecorder, PaperSource, QueueManager, QueueSettings,
    RecommendationSource,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedbackRecorder>,
}

impl AppState {
    /// Wires both sources, the session store and the recorder together
    ///
    /// Nothing is fetched until `queue().start()` runs.
    pub fn new(
        source: Arc<dyn PaperSource>,
        backend: Arc<dyn KeyValueStore>,
        settings: QueueSettings,
        lock_duration: Duration,
    ) -> Self {
        let queue = QueueManager::new(
            FallbackSource::new(source.clone()),
            RecommendationSource::new(source),
            SessionStore::new(backend),
            settings,
        );

        Self {
            feed: Arc::new(FeedbackRecorder::new(Arc::new(queue), lock_duration)),
        }
    }

    pub fn queue(&self) -> &Arc<QueueManager> {
        self.feed.queue()
    }
}
