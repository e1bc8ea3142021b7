use crate::adapters::{
    ColumnInfo, DatabaseAdapter, PostgresAdapter, SqliteAdapter, TableData, TableInfo,
};
use crate::sqlite;
use serde_json::{Map, Value};
use std::path::PathBuf;
use sw_core::error::DataError;
use sw_core::types::{DatabaseProvider, Project};

pub const DEFAULT_PAGE_SIZE: u32 = 50;

enum Adapter {
    Sqlite(SqliteAdapter),
    Postgres(PostgresAdapter),
}

/// Read/write access to a project's provisioned database. Each operation
/// opens a fresh connection and drops it on completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataBrowser;

impl DataBrowser {
    pub fn new() -> Self {
        Self
    }

    /// Resolution order: stored postgres URL, stored sqlite URL, then a scan
    /// of the project directory for a database file.
    async fn adapter_for(&self, project: &Project) -> Result<Adapter, DataError> {
        if project.database_provider == Some(DatabaseProvider::PostgresDocker)
            && let Some(url) = &project.database_url
        {
            return Ok(Adapter::Postgres(PostgresAdapter::connect(url).await?));
        }

        if project.database_provider == Some(DatabaseProvider::Sqlite)
            && let Some(url) = &project.database_url
        {
            let file_path = PathBuf::from(url.strip_prefix("file:").unwrap_or(url));
            return Ok(Adapter::Sqlite(SqliteAdapter::open(&file_path)?));
        }

        if let Some(db_path) = sqlite::find_database_path(&project.path) {
            return Ok(Adapter::Sqlite(SqliteAdapter::open(&db_path)?));
        }

        Err(DataError::DatabaseNotFound)
    }

    pub async fn get_tables(&self, project: &Project) -> Result<Vec<TableInfo>, DataError> {
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => adapter.get_tables().await,
            Adapter::Postgres(mut adapter) => adapter.get_tables().await,
        }
    }

    pub async fn get_table_schema(
        &self,
        project: &Project,
        table_name: &str,
    ) -> Result<Vec<ColumnInfo>, DataError> {
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => adapter.get_table_schema(table_name).await,
            Adapter::Postgres(mut adapter) => adapter.get_table_schema(table_name).await,
        }
    }

    pub async fn get_table_data(
        &self,
        project: &Project,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TableData, DataError> {
        let page = page.max(1);
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => adapter.get_table_data(table_name, page, page_size).await,
            Adapter::Postgres(mut adapter) => {
                adapter.get_table_data(table_name, page, page_size).await
            }
        }
    }

    pub async fn execute_query(
        &self,
        project: &Project,
        query: &str,
    ) -> Result<Vec<Value>, DataError> {
        reject_destructive(query)?;
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => adapter.execute_query(query).await,
            Adapter::Postgres(mut adapter) => adapter.execute_query(query).await,
        }
    }

    pub async fn insert_row(
        &self,
        project: &Project,
        table_name: &str,
        data: &Map<String, Value>,
    ) -> Result<(), DataError> {
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => adapter.insert_row(table_name, data).await,
            Adapter::Postgres(mut adapter) => adapter.insert_row(table_name, data).await,
        }
    }

    pub async fn update_row(
        &self,
        project: &Project,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
        data: &Map<String, Value>,
    ) -> Result<(), DataError> {
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => {
                adapter
                    .update_row(table_name, primary_key, primary_key_value, data)
                    .await
            }
            Adapter::Postgres(mut adapter) => {
                adapter
                    .update_row(table_name, primary_key, primary_key_value, data)
                    .await
            }
        }
    }

    pub async fn delete_row(
        &self,
        project: &Project,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
    ) -> Result<(), DataError> {
        match self.adapter_for(project).await? {
            Adapter::Sqlite(mut adapter) => {
                adapter
                    .delete_row(table_name, primary_key, primary_key_value)
                    .await
            }
            Adapter::Postgres(mut adapter) => {
                adapter
                    .delete_row(table_name, primary_key, primary_key_value)
                    .await
            }
        }
    }
}

/// The browser is wired into agent-facing tooling; schema-destroying SQL is
/// refused regardless of backend.
fn reject_destructive(query: &str) -> Result<(), DataError> {
    let normalized = query.trim().to_uppercase();
    if normalized.contains("DROP TABLE")
        || normalized.contains("DROP DATABASE")
        || normalized.contains("TRUNCATE")
    {
        return Err(DataError::DestructiveQuery);
    }
    Ok(())
}
