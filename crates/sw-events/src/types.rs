use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStreamEventKind {
    Start,
    Progress,
    Complete,
    Error,
}

/// One review lifecycle event as delivered to subscribers. Delivery is
/// at-most-once; late subscribers only see events emitted after they attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStreamEvent {
    #[serde(rename = "type")]
    pub kind: ReviewStreamEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ReviewStreamEvent {
    pub fn start(review_id: &str) -> Self {
        Self {
            kind: ReviewStreamEventKind::Start,
            review_id: Some(review_id.to_string()),
            data: None,
        }
    }

    pub fn complete(review_id: &str, data: Value) -> Self {
        Self {
            kind: ReviewStreamEventKind::Complete,
            review_id: Some(review_id.to_string()),
            data: Some(data),
        }
    }

    pub fn error(review_id: &str, message: &str) -> Self {
        Self {
            kind: ReviewStreamEventKind::Error,
            review_id: Some(review_id.to_string()),
            data: Some(serde_json::json!({ "error": message })),
        }
    }
}
