use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A recommendable paper as delivered by the upstream feed
///
/// Only `paper_id` is required. The common display fields are typed for
/// convenience; everything else the upstream sends (authors, journal,
/// external ids, open access links, ...) is carried through untouched in
/// `extra` so it can be stored and handed back to the UI verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub paper_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Paper {
    /// Creates a paper carrying nothing but its identifier
    pub fn new(paper_id: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            title: None,
            abstract_text: None,
            citation_count: None,
            publication_date: None,
            extra: Map::new(),
        }
    }

    /// Decodes one upstream entry, rejecting anything without a usable id
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value::<Paper>(value) {
            Ok(paper) if !paper.paper_id.trim().is_empty() => Some(paper),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping undecodable paper entry");
                None
            }
        }
    }
}
