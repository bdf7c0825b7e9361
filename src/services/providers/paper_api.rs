//! HTTP provider for the paper backend
//!
//! Endpoints:
//! 1. Feed: GET /feed?limit=N[&field=TOPIC] → array of papers or {error}
//! 2. Recommendations: POST /recommendations → array of papers
//! 3. Cursor reset: POST /reset-fallback

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Paper, RecommendationRequest},
    services::providers::{PaperSource, RecommendationResponse},
};
use reqwest::Client as HttpClient;
use serde_json::Value;

#[derive(Clone)]
pub struct PaperApiClient {
    http_client: HttpClient,
    api_url: String,
}

impl PaperApiClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.paper_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Turns an array body into papers, dropping entries without an id
    fn parse_papers(entries: Vec<Value>) -> Vec<Paper> {
        let total = entries.len();
        let papers: Vec<Paper> = entries.into_iter().filter_map(Paper::from_value).collect();

        if papers.len() < total {
            tracing::debug!(
                dropped = total - papers.len(),
                "Dropped undecodable papers from upstream batch"
            );
        }

        papers
    }

    /// Pulls the `error` message out of an upstream `{error: ...}` body
    fn error_message(body: &Value) -> Option<String> {
        body.get("error").map(|e| match e.as_str() {
            Some(msg) => msg.to_string(),
            None => e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl PaperSource for PaperApiClient {
    async fn fetch_feed(&self, limit: usize, field: Option<String>) -> AppResult<Vec<Paper>> {
        let url = format!("{}/feed", self.api_url);

        let mut query = vec![("limit", limit.to_string())];
        if let Some(field) = field.filter(|f| !f.is_empty()) {
            query.push(("field", field));
        }

        let response = self.http_client.get(&url).query(&query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        let body: Value = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(AppError::ExternalApi(format!(
                    "Feed API returned status {}: {}",
                    status, text
                )));
            }
            Err(e) => {
                tracing::error!(error = %e, response = %text, "Failed to parse feed response");
                return Err(AppError::ExternalApi(format!(
                    "Failed to parse feed response: {}",
                    e
                )));
            }
        };

        if let Some(message) = Self::error_message(&body) {
            return Err(AppError::ExternalApi(message));
        }

        if !status.is_success() {
            return Err(AppError::ExternalApi(format!(
                "Feed API returned status {}",
                status
            )));
        }

        match body {
            Value::Array(entries) => {
                let papers = Self::parse_papers(entries);
                tracing::info!(
                    limit = limit,
                    results = papers.len(),
                    provider = self.name(),
                    "Feed batch fetched"
                );
                Ok(papers)
            }
            other => {
                tracing::warn!(response = %other, "Unexpected feed response format");
                Err(AppError::ExternalApi(
                    "Unexpected feed response format".to_string(),
                ))
            }
        }
    }

    async fn fetch_recommendations(
        &self,
        positive_ids: Vec<String>,
        negative_ids: Vec<String>,
    ) -> AppResult<RecommendationResponse> {
        let url = format!("{}/recommendations", self.api_url);
        let request = RecommendationRequest {
            positive_paper_ids: positive_ids,
            negative_paper_ids: negative_ids,
        };

        let response = self.http_client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Recommendation API returned status {}: {}",
                status, body
            )));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(entries) => {
                let papers = Self::parse_papers(entries);
                tracing::info!(
                    positive = request.positive_paper_ids.len(),
                    negative = request.negative_paper_ids.len(),
                    results = papers.len(),
                    provider = self.name(),
                    "Recommendation batch fetched"
                );
                Ok(RecommendationResponse::Papers(papers))
            }
            other => Ok(RecommendationResponse::Unexpected(other)),
        }
    }

    async fn reset_fallback(&self) -> AppResult<()> {
        let url = format!("{}/reset-fallback", self.api_url);
        let response = self.http_client.post(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Reset API returned status {}: {}",
                status, body
            )));
        }

        tracing::info!(provider = self.name(), "Upstream feed cursor reset");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "paper-api"
    }
}
