use crate::types::enums::{IssueCategory, IssueSeverity, ReviewStatus};
use crate::types::ids::{MessageId, ProjectId, ReviewId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub project_id: ProjectId,
    pub status: ReviewStatus,
    pub trigger_message_id: Option<MessageId>,
    pub summary: Option<String>,
    pub overall_score: Option<u8>,
    pub issues: Vec<ReviewIssue>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    pub cost: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One finding produced by the review parser. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewIssue {
    pub severity: IssueSeverity,
    pub category: IssueCategory,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub auto_fixable: bool,
}

impl ReviewIssue {
    pub fn qualifies_for_auto_fix(&self) -> bool {
        self.auto_fixable
            && matches!(self.severity, IssueSeverity::Critical | IssueSeverity::High)
    }
}

/// Normalized parser output; every field is guaranteed present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub summary: String,
    pub overall_score: u8,
    pub issues: Vec<ReviewIssue>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
}
