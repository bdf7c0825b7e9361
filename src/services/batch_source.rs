use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Paper, RecommendationRequest},
    services::providers::{PaperSource, RecommendationResponse},
};

/// One upstream batch, in upstream order, not yet checked against `seen`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    papers: Vec<Paper>,
}

impl Batch {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self { papers }
    }

    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }

    /// Keeps only papers the user has not seen, preserving upstream order
    ///
    /// Upstream is not trusted to honour exclusions, and a batch may repeat
    /// an id; only its first occurrence is kept.
    pub fn retain_unseen(self, seen: &HashSet<String>) -> Vec<Paper> {
        let mut admitted = HashSet::new();
        self.papers
            .into_iter()
            .filter(|p| !seen.contains(&p.paper_id) && admitted.insert(p.paper_id.clone()))
            .collect()
    }
}

/// The default, non-personalised supply of papers
#[derive(Clone)]
pub struct FallbackSource {
    source: Arc<dyn PaperSource>,
}

impl FallbackSource {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, limit: usize, field: Option<String>) -> AppResult<Batch> {
        let papers = self.source.fetch_feed(limit, field).await?;
        Ok(Batch::new(papers))
    }

    /// Asks upstream to restart the default feed from the beginning
    pub async fn reset(&self) -> AppResult<()> {
        self.source.reset_fallback().await
    }
}

/// Personalised batches scored against the session's feedback
#[derive(Clone)]
pub struct RecommendationSource {
    source: Arc<dyn PaperSource>,
}

impl RecommendationSource {
    pub fn new(source: Arc<dyn PaperSource>) -> Self {
        Self { source }
    }

    /// Returns `None` when upstream answered with something other than a
    /// list of papers; that is logged and otherwise ignored.
    pub async fn fetch(&self, request: RecommendationRequest) -> AppResult<Option<Batch>> {
        let response = self
            .source
            .fetch_recommendations(request.positive_paper_ids, request.negative_paper_ids)
            .await?;

        match response {
            RecommendationResponse::Papers(papers) => Ok(Some(Batch::new(papers))),
            RecommendationResponse::Unexpected(body) => {
                tracing::warn!(
                    provider = self.source.name(),
                    response = %body,
                    "Unexpected format from recommendation endpoint"
                );
                Ok(None)
            }
        }
    }
}
