//! Upstream paper provider abstraction
//!
//! The feed and recommendation endpoints are served by one backend, so a
//! single provider covers the default feed, the scored recommendation batch
//! and the server-side feed cursor reset.

use serde_json::Value;

use crate::{error::AppResult, models::Paper};

pub mod paper_api;

pub use paper_api::PaperApiClient;

/// Response of the recommendation endpoint
///
/// The endpoint is expected to answer with an array of papers. Anything else
/// is kept as `Unexpected` so callers can log it and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationResponse {
    Papers(Vec<Paper>),
    Unexpected(Value),
}

/// Trait for upstream paper providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PaperSource: Send + Sync {
    /// Pull the next page of the default feed, optionally scoped to a field
    async fn fetch_feed(&self, limit: usize, field: Option<String>) -> AppResult<Vec<Paper>>;

    /// Pull a batch scored against the accumulated feedback
    async fn fetch_recommendations(
        &self,
        positive_ids: Vec<String>,
        negative_ids: Vec<String>,
    ) -> AppResult<RecommendationResponse>;

    /// Tell upstream to forget its default feed cursor
    async fn reset_fallback(&self) -> AppResult<()>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
