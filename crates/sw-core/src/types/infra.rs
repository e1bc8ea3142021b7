use crate::types::enums::{DatabaseProvider, DatabaseState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Host container-runtime availability, as last probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfraStatus {
    pub runtime: RuntimeStatus,
    pub default_provider: DatabaseProvider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDatabaseStatus {
    pub provider: DatabaseProvider,
    pub status: DatabaseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Connection material for a provisioned project database. Containerized
/// credentials are only known at creation time; callers that need them later
/// must persist this config (the serve layer stores provider and url on the
/// project record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum DatabaseConfig {
    #[serde(rename_all = "camelCase")]
    PostgresDocker {
        url: String,
        container_id: String,
        container_name: String,
        port: u16,
        database: String,
        username: String,
        password: String,
    },
    #[serde(rename_all = "camelCase")]
    Sqlite {
        url: String,
        #[schema(value_type = String)]
        file_path: PathBuf,
    },
}

impl DatabaseConfig {
    pub fn provider(&self) -> DatabaseProvider {
        match self {
            Self::PostgresDocker { .. } => DatabaseProvider::PostgresDocker,
            Self::Sqlite { .. } => DatabaseProvider::Sqlite,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::PostgresDocker { url, .. } | Self::Sqlite { url, .. } => url,
        }
    }
}
