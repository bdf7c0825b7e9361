use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Feedback, Paper};
use crate::db::StoreKey;

/// Feedback history for the current session
///
/// Liked and disliked papers keep their full record in insertion order;
/// skipped papers only keep their id. Every recorded paper is terminal: once
/// its id is in any of the three collections it cannot be recorded again
/// until the session is reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub liked: Vec<Paper>,
    pub disliked: Vec<Paper>,
    pub skipped: Vec<String>,
}

impl SessionState {
    pub fn new(liked: Vec<Paper>, disliked: Vec<Paper>, skipped: Vec<String>) -> Self {
        Self {
            liked,
            disliked,
            skipped,
        }
    }

    pub fn liked_ids(&self) -> Vec<String> {
        self.liked.iter().map(|p| p.paper_id.clone()).collect()
    }

    pub fn disliked_ids(&self) -> Vec<String> {
        self.disliked.iter().map(|p| p.paper_id.clone()).collect()
    }

    /// Every id the user must never be shown again
    ///
    /// Recomputed on each call so callers always filter against the latest
    /// feedback.
    pub fn seen(&self) -> HashSet<String> {
        self.liked
            .iter()
            .chain(self.disliked.iter())
            .map(|p| p.paper_id.clone())
            .chain(self.skipped.iter().cloned())
            .collect()
    }

    pub fn is_seen(&self, paper_id: &str) -> bool {
        self.liked.iter().any(|p| p.paper_id == paper_id)
            || self.disliked.iter().any(|p| p.paper_id == paper_id)
            || self.skipped.iter().any(|id| id == paper_id)
    }

    /// Records feedback for a paper
    ///
    /// Returns the durable key of the collection that changed, or `None` when
    /// the paper already has feedback and nothing was recorded.
    pub fn record(&mut self, feedback: Feedback, paper: &Paper) -> Option<StoreKey> {
        if self.is_seen(&paper.paper_id) {
            return None;
        }

        match feedback {
            Feedback::Like => {
                self.liked.push(paper.clone());
                Some(StoreKey::LikedPapers)
            }
            Feedback::Dislike => {
                self.disliked.push(paper.clone());
                Some(StoreKey::DislikedPapers)
            }
            Feedback::Skip => {
                self.skipped.push(paper.paper_id.clone());
                Some(StoreKey::SkippedIds)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.liked.is_empty() && self.disliked.is_empty() && self.skipped.is_empty()
    }

    pub fn clear(&mut self) {
        self.liked.clear();
        self.disliked.clear();
        self.skipped.clear();
    }
}
