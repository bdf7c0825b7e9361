use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod paper;
pub mod session;

pub use paper::Paper;
pub use session::SessionState;

/// A decision the user makes about the displayed paper
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Like,
    Dislike,
    Skip,
}

impl Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Like => write!(f, "like"),
            Feedback::Dislike => write!(f, "dislike"),
            Feedback::Skip => write!(f, "skip"),
        }
    }
}

/// Body sent to the recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub positive_paper_ids: Vec<String>,
    pub negative_paper_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_serialization() {
        assert_eq!(serde_json::to_string(&Feedback::Like).unwrap(), "\"like\"");
        assert_eq!(
            serde_json::to_string(&Feedback::Dislike).unwrap(),
            "\"dislike\""
        );
        assert_eq!(Feedback::Skip.to_string(), "skip");
    }

    #[test]
    fn test_recommendation_request_uses_upstream_field_names() {
        let request = RecommendationRequest {
            positive_paper_ids: vec!["p1".to_string(), "p4".to_string()],
            negative_paper_ids: vec!["p2".to_string()],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "positivePaperIds": ["p1", "p4"],
                "negativePaperIds": ["p2"]
            })
        );
    }
}
