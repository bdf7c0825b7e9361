use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{
    db::SessionStore,
    error::AppResult,
    models::{Feedback, Paper, RecommendationRequest, SessionState},
    services::batch_source::{Batch, FallbackSource, RecommendationSource},
};

/// Tunables for queue refills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    /// Papers requested per fallback batch
    pub batch_limit: usize,
    /// Request a recommendation batch every this many actions
    pub recommend_every: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            batch_limit: 5,
            recommend_every: 5,
        }
    }
}

/// What the presentation layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Loading,
    Ready,
    Empty,
    Error,
}

/// Follow-up work produced by one `advance` step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdvanceStep {
    /// Generation the step was taken in; both fetches are tagged with it
    pub generation: u64,
    /// Fire-and-forget recommendation fetch to start
    pub recommend: Option<RecommendationRequest>,
    /// Both queues ran dry; a fallback fetch must run
    pub refill: bool,
}

/// Session history, both queues and the displayed paper
///
/// The displayed paper is always the head of `fallback_queue`. Every fetch
/// is tagged with `generation`; a reset bumps it so results of fetches
/// started earlier are discarded.
#[derive(Debug)]
pub struct QueueState {
    pub(crate) session: SessionState,
    pub(crate) fallback_queue: VecDeque<Paper>,
    pub(crate) recommendation_queue: Vec<Paper>,
    pub(crate) current: Option<Paper>,
    pub(crate) action_count: u64,
    pub(crate) loading: bool,
    pub(crate) error: Option<String>,
    pub(crate) generation: u64,
    pub(crate) selected_field: Option<String>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            session: SessionState::default(),
            fallback_queue: VecDeque::new(),
            recommendation_queue: Vec::new(),
            current: None,
            action_count: 0,
            loading: true,
            error: None,
            generation: 0,
            selected_field: None,
        }
    }
}

impl QueueState {
    pub fn status(&self) -> FeedStatus {
        if self.loading {
            FeedStatus::Loading
        } else if self.error.is_some() {
            FeedStatus::Error
        } else if self.current.is_some() {
            FeedStatus::Ready
        } else {
            FeedStatus::Empty
        }
    }

    /// Moves past the displayed paper
    ///
    /// The fallback queue is drained first. When it runs dry the pending
    /// recommendation batch becomes the new fallback queue; when that is
    /// empty too the caller has to refill. Heads whose id has entered `seen`
    /// since they were queued are dropped on the way.
    pub fn advance(&mut self, recommend_every: u64) -> AdvanceStep {
        let mut step = AdvanceStep {
            generation: self.generation,
            ..AdvanceStep::default()
        };

        self.action_count += 1;
        if recommend_every > 0 && self.action_count % recommend_every == 0 {
            step.recommend = Some(RecommendationRequest {
                positive_paper_ids: self.session.liked_ids(),
                negative_paper_ids: self.session.disliked_ids(),
            });
        }

        self.fallback_queue.pop_front();
        self.drop_seen_heads();

        self.promote_recommendations();

        self.current = self.fallback_queue.front().cloned();
        if self.current.is_none() {
            self.loading = true;
            step.refill = true;
        }

        step
    }

    fn drop_seen_heads(&mut self) {
        while let Some(head) = self.fallback_queue.front() {
            if !self.session.is_seen(&head.paper_id) {
                break;
            }
            tracing::debug!(paper_id = %head.paper_id, "Dropping already seen paper from queue");
            self.fallback_queue.pop_front();
        }
    }

    /// Forgets everything but the topic filter and starts a new generation
    pub fn reset(&mut self) -> u64 {
        self.session.clear();
        self.discard_queues();
        self.generation
    }

    /// Drops both queues and the displayed paper, keeping the history
    pub fn discard_queues(&mut self) -> u64 {
        self.fallback_queue.clear();
        self.recommendation_queue.clear();
        self.current = None;
        self.action_count = 0;
        self.error = None;
        self.loading = true;
        self.generation += 1;
        self.generation
    }

    /// Makes the pending recommendation batch the fallback supply
    fn promote_recommendations(&mut self) {
        if !self.fallback_queue.is_empty() || self.recommendation_queue.is_empty() {
            return;
        }
        self.fallback_queue = std::mem::take(&mut self.recommendation_queue).into();
        self.drop_seen_heads();
    }

    /// Completion of a fallback fetch
    fn accept_fallback(&mut self, result: AppResult<Batch>) {
        self.loading = false;
        match result {
            Ok(batch) => {
                let received = batch.len();
                let seen = self.session.seen();
                let papers = batch.retain_unseen(&seen);

                tracing::info!(
                    received = received,
                    admitted = papers.len(),
                    "Fallback batch queued"
                );

                self.fallback_queue = papers.into();
                self.promote_recommendations();
                self.current = self.fallback_queue.front().cloned();
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fallback fetch failed");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Completion of a recommendation fetch; the newest result wins
    ///
    /// If nothing is displayed and no fallback fetch is running, the batch is
    /// promoted right away so the feed recovers from an empty or failed state.
    fn accept_recommendations(&mut self, result: AppResult<Option<Batch>>) {
        match result {
            Ok(Some(batch)) => {
                let received = batch.len();
                let seen = self.session.seen();
                self.recommendation_queue = batch.retain_unseen(&seen);

                tracing::info!(
                    received = received,
                    admitted = self.recommendation_queue.len(),
                    "Recommendation batch queued"
                );

                if self.current.is_none() && !self.loading {
                    self.promote_recommendations();
                    self.current = self.fallback_queue.front().cloned();
                    if self.current.is_some() {
                        self.error = None;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Recommendation batch fetch failed");
            }
        }
    }
}

/// Read-only view of the feed for the presentation layer
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub current: Option<Paper>,
    pub loading: bool,
    pub error: Option<String>,
    pub locked: bool,
    pub action_count: u64,
    pub selected_field: Option<String>,
}

/// Liked/disliked history for the history panel
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub liked_items: Vec<Paper>,
    pub disliked_items: Vec<Paper>,
    pub skipped_count: usize,
    pub show_history: bool,
    pub storage_kb: f64,
}

/// Owns the two sources and the queue state
pub struct QueueManager {
    pub(crate) state: Arc<Mutex<QueueState>>,
    pub(crate) store: SessionStore,
    fallback: FallbackSource,
    recommendations: RecommendationSource,
    settings: QueueSettings,
    in_flight: StdMutex<Vec<JoinHandle<()>>>,
}

impl QueueManager {
    pub fn new(
        fallback: FallbackSource,
        recommendations: RecommendationSource,
        store: SessionStore,
        settings: QueueSettings,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            store,
            fallback,
            recommendations,
            settings,
            in_flight: StdMutex::new(Vec::new()),
        }
    }

    pub fn settings(&self) -> QueueSettings {
        self.settings
    }

    /// Restores the durable history, then loads the first batch
    ///
    /// The state lock is held while the store is read, so feedback, resets
    /// and topic changes issued meanwhile apply on top of the restored
    /// history instead of being overwritten by it.
    pub async fn start(&self) {
        let (generation, field) = {
            let mut state = self.state.lock().await;
            state.session = self.store.restore().await;
            state.selected_field = self.store.preferences().await.selected_field;
            state.loading = true;
            (state.generation, state.selected_field.clone())
        };

        self.refill_fallback(generation, field).await;
    }

    /// Advances past the displayed paper without recording feedback
    #[cfg(test)]
    pub(crate) async fn advance(&self) {
        let step = {
            let mut state = self.state.lock().await;
            state.advance(self.settings.recommend_every)
        };
        self.follow_up(step).await;
    }

    /// Records feedback on the displayed paper, persists it and advances
    ///
    /// Returns `None` when nothing is displayed.
    pub(crate) async fn apply(&self, feedback: Feedback) -> Option<AdvanceStep> {
        let mut state = self.state.lock().await;

        let Some(paper) = state.current.clone() else {
            tracing::debug!(feedback = %feedback, "Ignoring action with no paper displayed");
            return None;
        };

        if let Some(key) = state.session.record(feedback, &paper) {
            self.store.persist_slot(key, &state.session).await;
        }

        tracing::info!(
            paper_id = %paper.paper_id,
            feedback = %feedback,
            action_count = state.action_count + 1,
            "Feedback recorded"
        );

        Some(state.advance(self.settings.recommend_every))
    }

    /// Runs the work an `advance` step asked for, outside the state lock
    pub(crate) async fn follow_up(&self, step: AdvanceStep) {
        if let Some(request) = step.recommend {
            self.spawn_recommendation_fetch(step.generation, request);
        }

        if step.refill {
            let field = self.state.lock().await.selected_field.clone();
            self.refill_fallback(step.generation, field).await;
        }
    }

    /// Forgets the whole session and starts over from a fresh feed
    pub async fn reset_session(&self) {
        self.reset_upstream().await;

        let (generation, field) = {
            let mut state = self.state.lock().await;
            let generation = state.reset();
            self.store.clear().await;
            (generation, state.selected_field.clone())
        };

        tracing::info!(generation = generation, "Session reset");
        self.refill_fallback(generation, field).await;
    }

    /// Fetches a fallback batch and makes its head the displayed paper
    pub(crate) async fn refill_fallback(&self, generation: u64, field: Option<String>) {
        let result = self
            .fallback
            .fetch(self.settings.batch_limit, field)
            .await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!(
                generation = generation,
                current_generation = state.generation,
                "Discarding stale fallback batch"
            );
            return;
        }
        state.accept_fallback(result);
    }

    fn spawn_recommendation_fetch(&self, generation: u64, request: RecommendationRequest) {
        tracing::info!(
            positive = request.positive_paper_ids.len(),
            negative = request.negative_paper_ids.len(),
            "Requesting recommendation batch"
        );

        let state = Arc::clone(&self.state);
        let source = self.recommendations.clone();
        let task = tokio::spawn(async move {
            let result = source.fetch(request).await;

            let mut state = state.lock().await;
            if state.generation != generation {
                tracing::debug!(
                    generation = generation,
                    current_generation = state.generation,
                    "Discarding stale recommendation batch"
                );
                return;
            }
            state.accept_recommendations(result);
        });

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.retain(|handle| !handle.is_finished());
        in_flight.push(task);
    }

    /// Waits for every recommendation fetch started so far
    pub async fn settle(&self) {
        let pending: Vec<JoinHandle<()>> = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *in_flight)
        };

        for handle in pending {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Recommendation task join error");
            }
        }
    }

    /// Retries the fallback fetch when nothing is displayed or loading
    pub async fn refresh(&self) {
        let (generation, field) = {
            let mut state = self.state.lock().await;
            if state.loading || state.current.is_some() {
                return;
            }
            state.loading = true;
            (state.generation, state.selected_field.clone())
        };

        self.refill_fallback(generation, field).await;
    }

    /// Switches the topic filter and restarts the feed under it
    ///
    /// Feedback history is kept; queued papers from the old topic are not.
    pub async fn select_field(&self, field: Option<String>) {
        let field = field
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        self.store.save_selected_field(field.as_deref()).await;
        self.reset_upstream().await;

        let generation = {
            let mut state = self.state.lock().await;
            state.selected_field = field.clone();
            state.discard_queues()
        };

        tracing::info!(field = ?field, "Topic filter changed");
        self.refill_fallback(generation, field).await;
    }

    /// Tells upstream to restart the default feed
    async fn reset_upstream(&self) {
        if let Err(e) = self.fallback.reset().await {
            tracing::warn!(error = %e, "Failed to reset upstream feed cursor");
        }
    }

    pub async fn snapshot(&self, locked: bool) -> FeedSnapshot {
        let state = self.state.lock().await;
        FeedSnapshot {
            status: state.status(),
            current: state.current.clone(),
            loading: state.loading,
            error: state.error.clone(),
            locked,
            action_count: state.action_count,
            selected_field: state.selected_field.clone(),
        }
    }

    pub async fn history(&self) -> History {
        let (liked_items, disliked_items, skipped_count) = {
            let state = self.state.lock().await;
            (
                state.session.liked.clone(),
                state.session.disliked.clone(),
                state.session.skipped.len(),
            )
        };

        History {
            liked_items,
            disliked_items,
            skipped_count,
            show_history: self.store.preferences().await.show_history,
            storage_kb: self.store.usage_kb().await,
        }
    }

    pub async fn set_show_history(&self, show: bool) {
        self.store.save_show_history(show).await;
    }

    pub async fn current(&self) -> Option<Paper> {
        self.state.lock().await.current.clone()
    }
}
