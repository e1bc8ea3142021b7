use crate::types::enums::DatabaseProvider;
use crate::types::ids::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[schema(value_type = String)]
    pub path: PathBuf,
    pub database_provider: Option<DatabaseProvider>,
    pub database_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
