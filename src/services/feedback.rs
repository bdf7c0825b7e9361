use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    models::Feedback,
    services::{
        action_lock::ActionLock,
        queue::{FeedSnapshot, QueueManager},
    },
};

/// Result of a like/dislike/skip request
///
/// Requests arriving while the lock is held or with nothing displayed are
/// ignored; they are reported here rather than treated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied,
    Locked,
    NoCurrentItem,
}

/// Entry point for every user decision
///
/// All mutation of the session history goes through here: feedback is
/// recorded, persisted and followed by a queue advance.
pub struct FeedbackRecorder {
    queue: Arc<QueueManager>,
    lock: ActionLock,
    lock_duration: Duration,
}

impl FeedbackRecorder {
    pub fn new(queue: Arc<QueueManager>, lock_duration: Duration) -> Self {
        Self {
            queue,
            lock: ActionLock::new(),
            lock_duration,
        }
    }

    pub fn queue(&self) -> &Arc<QueueManager> {
        &self.queue
    }

    pub fn lock(&self) -> &ActionLock {
        &self.lock
    }

    pub async fn record_like(&self) -> ActionOutcome {
        self.record(Feedback::Like).await
    }

    pub async fn record_dislike(&self) -> ActionOutcome {
        self.record(Feedback::Dislike).await
    }

    pub async fn record_skip(&self) -> ActionOutcome {
        self.record(Feedback::Skip).await
    }

    /// Applies feedback to the displayed paper and moves on
    pub async fn record(&self, feedback: Feedback) -> ActionOutcome {
        if !self.lock.try_engage(self.lock_duration) {
            tracing::debug!(feedback = %feedback, "Ignoring action while locked");
            return ActionOutcome::Locked;
        }

        match self.queue.apply(feedback).await {
            Some(step) => {
                self.queue.follow_up(step).await;
                ActionOutcome::Applied
            }
            None => {
                self.lock.release();
                ActionOutcome::NoCurrentItem
            }
        }
    }

    /// Forgets the whole session and starts over from a fresh feed
    pub async fn reset_session(&self) {
        self.queue.reset_session().await;
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.queue.snapshot(self.lock.is_locked()).await
    }
}
