pub mod postgres;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sw_core::error::DataError;
use utoipa::ToSchema;

pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    pub row_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Value>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Rows are JSON objects keyed by column name; both backends produce the
/// same shape so the browser layer stays backend-agnostic.
pub trait DatabaseAdapter {
    fn get_tables(&mut self) -> impl Future<Output = Result<Vec<TableInfo>, DataError>> + Send;
    fn get_table_schema(
        &mut self,
        table_name: &str,
    ) -> impl Future<Output = Result<Vec<ColumnInfo>, DataError>> + Send;
    fn get_table_data(
        &mut self,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<TableData, DataError>> + Send;
    fn execute_query(
        &mut self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<Value>, DataError>> + Send;
    fn insert_row(
        &mut self,
        table_name: &str,
        data: &serde_json::Map<String, Value>,
    ) -> impl Future<Output = Result<(), DataError>> + Send;
    fn update_row(
        &mut self,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
        data: &serde_json::Map<String, Value>,
    ) -> impl Future<Output = Result<(), DataError>> + Send;
    fn delete_row(
        &mut self,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
    ) -> impl Future<Output = Result<(), DataError>> + Send;
}

/// Table and column names are interpolated into SQL as quoted identifiers;
/// reject anything that could escape the quoting.
pub fn validate_identifier(name: &str) -> Result<(), DataError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DataError::QueryFailed {
            message: format!("invalid identifier: {name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        validate_identifier("users").unwrap();
        validate_identifier("_app_meta").unwrap();
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("users; DROP TABLE x").is_err());
        assert!(validate_identifier("users\"").is_err());
    }
}
