use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use paper_feed::config::Config;
use paper_feed::error::AppError;
use paper_feed::services::{PaperApiClient, PaperSource, RecommendationResponse};

fn client_for(upstream: &MockServer) -> PaperApiClient {
    let config = Config {
        paper_api_url: format!("{}/", upstream.uri()),
        ..Config::default()
    };
    PaperApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_feed_sends_limit_and_field() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("limit", "5"))
        .and(query_param("field", "Computer Science"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "paperId": "cs1", "title": "Attention", "citationCount": 90000 },
            { "title": "no id" },
            { "paperId": "cs2", "venue": "NeurIPS" }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let papers = assert_ok!(
        client_for(&upstream)
            .fetch_feed(5, Some("Computer Science".to_string()))
            .await
    );

    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].paper_id, "cs1");
    assert_eq!(papers[0].citation_count, Some(90000));
    assert_eq!(papers[1].extra.get("venue"), Some(&json!("NeurIPS")));
}

#[tokio::test]
async fn test_fetch_feed_error_body_becomes_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "No papers found" })),
        )
        .mount(&upstream)
        .await;

    let err = assert_err!(client_for(&upstream).fetch_feed(5, None).await);
    assert_eq!(err.to_string(), "No papers found");
}

#[tokio::test]
async fn test_fetch_feed_non_json_failure() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&upstream)
        .await;

    let err = assert_err!(client_for(&upstream).fetch_feed(5, None).await);
    assert!(matches!(err, AppError::ExternalApi(_)));
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_fetch_feed_rejects_object_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "papers": [] })))
        .mount(&upstream)
        .await;

    assert_err!(client_for(&upstream).fetch_feed(5, None).await);
}

#[tokio::test]
async fn test_fetch_recommendations_posts_feedback_ids() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .and(body_json(json!({
            "positivePaperIds": ["p1", "p4"],
            "negativePaperIds": ["p2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "paperId": "r1" }])))
        .expect(1)
        .mount(&upstream)
        .await;

    let response = assert_ok!(
        client_for(&upstream)
            .fetch_recommendations(
                vec!["p1".to_string(), "p4".to_string()],
                vec!["p2".to_string()],
            )
            .await
    );

    match response {
        RecommendationResponse::Papers(papers) => {
            assert_eq!(papers.len(), 1);
            assert_eq!(papers[0].paper_id, "r1");
        }
        other => panic!("expected papers, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_recommendations_unexpected_shape() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "warming up" })))
        .mount(&upstream)
        .await;

    let response = assert_ok!(
        client_for(&upstream)
            .fetch_recommendations(Vec::new(), Vec::new())
            .await
    );
    assert_eq!(
        response,
        RecommendationResponse::Unexpected(json!({ "status": "warming up" }))
    );
}

#[tokio::test]
async fn test_reset_fallback() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset-fallback"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&upstream)
        .await;

    assert_ok!(client_for(&upstream).reset_fallback().await);
}

#[tokio::test]
async fn test_reset_fallback_failure_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reset-fallback"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;

    let err = assert_err!(client_for(&upstream).reset_fallback().await);
    assert!(err.to_string().contains("boom"));
}
