use crate::types::enums::{DatabaseProvider, MessageRole};
use crate::types::ids::{MessageId, ProjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub name: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    #[serde(default)]
    pub database_provider: Option<DatabaseProvider>,
    #[serde(default)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReviewInput {
    pub project_id: ProjectId,
    pub trigger_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateMessageInput {
    pub project_id: ProjectId,
    pub role: MessageRole,
    pub content: String,
    pub metadata: Option<Value>,
}

/// One tool invocation reported by the build agent; only the name matters for
/// review gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolActivity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}
