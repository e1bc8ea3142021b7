use crate::adapters::{ColumnInfo, DatabaseAdapter, TableData, TableInfo, validate_identifier};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ToSql};
use serde_json::{Map, Value, json};
use std::path::Path;
use sw_core::error::DataError;

const INTERNAL_TABLE_PREFIXES: &[&str] = &["sqlite_", "_app_"];

pub struct SqliteAdapter {
    conn: Connection,
}

impl SqliteAdapter {
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let conn = Connection::open(path).map_err(|err| DataError::ConnectionFailed {
            message: err.to_string(),
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| DataError::ConnectionFailed {
                message: err.to_string(),
            })?;
        Ok(Self { conn })
    }

    fn count_rows(&self, table_name: &str) -> Result<u64, DataError> {
        self.conn
            .query_row(
                &format!("SELECT COUNT(*) FROM \"{table_name}\""),
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count as u64)
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })
    }

    fn schema(&self, table_name: &str) -> Result<Vec<ColumnInfo>, DataError> {
        validate_identifier(table_name)?;
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info(\"{table_name}\")"))
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get::<_, String>(1)?,
                    column_type: row.get::<_, String>(2)?,
                    nullable: row.get::<_, i64>(3)? == 0,
                    primary_key: row.get::<_, i64>(5)? == 1,
                })
            })
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(columns)
    }

    fn query_rows(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Value>, DataError> {
        let mut stmt = self.conn.prepare(sql).map_err(|err| DataError::QueryFailed {
            message: err.to_string(),
        })?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query(params).map_err(|err| DataError::QueryFailed {
            message: err.to_string(),
        })?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|err| DataError::QueryFailed {
            message: err.to_string(),
        })? {
            let mut object = Map::new();
            for (index, name) in column_names.iter().enumerate() {
                let value = row.get_ref(index).map_err(|err| DataError::QueryFailed {
                    message: err.to_string(),
                })?;
                object.insert(name.clone(), value_ref_to_json(value));
            }
            out.push(Value::Object(object));
        }
        Ok(out)
    }
}

impl DatabaseAdapter for SqliteAdapter {
    async fn get_tables(&mut self) -> Result<Vec<TableInfo>, DataError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '\\_app\\_%' ESCAPE '\\'",
            )
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        drop(stmt);

        let mut tables = Vec::new();
        for name in names {
            if INTERNAL_TABLE_PREFIXES
                .iter()
                .any(|prefix| name.starts_with(prefix))
            {
                continue;
            }
            let row_count = self.count_rows(&name)?;
            tables.push(TableInfo { name, row_count });
        }
        Ok(tables)
    }

    async fn get_table_schema(&mut self, table_name: &str) -> Result<Vec<ColumnInfo>, DataError> {
        self.schema(table_name)
    }

    async fn get_table_data(
        &mut self,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TableData, DataError> {
        let columns = self.schema(table_name)?;
        let total = self.count_rows(table_name)?;
        let limit = i64::from(page_size);
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let rows = self.query_rows(
            &format!("SELECT * FROM \"{table_name}\" LIMIT ?1 OFFSET ?2"),
            &[&limit, &offset],
        )?;
        Ok(TableData {
            columns,
            rows,
            total,
            page,
            page_size,
        })
    }

    async fn execute_query(&mut self, query: &str) -> Result<Vec<Value>, DataError> {
        let column_count = {
            let stmt = self.conn.prepare(query).map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
            stmt.column_count()
        };

        if column_count > 0 {
            self.query_rows(query, &[])
        } else {
            // Writers report nothing; only row-returning statements yield rows.
            self.conn
                .execute(query, [])
                .map_err(|err| DataError::QueryFailed {
                    message: err.to_string(),
                })?;
            Ok(Vec::new())
        }
    }

    async fn insert_row(
        &mut self,
        table_name: &str,
        data: &Map<String, Value>,
    ) -> Result<(), DataError> {
        validate_identifier(table_name)?;
        let keys: Vec<&String> = data.keys().collect();
        for key in &keys {
            validate_identifier(key)?;
        }
        let columns = keys
            .iter()
            .map(|key| format!("\"{key}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=keys.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO \"{table_name}\" ({columns}) VALUES ({placeholders})");

        let params: Vec<rusqlite::types::Value> = data.values().map(json_to_sql).collect();
        self.conn
            .execute(&sql, rusqlite::params_from_iter(params))
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(())
    }

    async fn update_row(
        &mut self,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
        data: &Map<String, Value>,
    ) -> Result<(), DataError> {
        validate_identifier(table_name)?;
        validate_identifier(primary_key)?;
        let keys: Vec<&String> = data.keys().collect();
        for key in &keys {
            validate_identifier(key)?;
        }
        let set_clause = keys
            .iter()
            .enumerate()
            .map(|(i, key)| format!("\"{key}\" = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE \"{table_name}\" SET {set_clause} WHERE \"{primary_key}\" = ?{}",
            keys.len() + 1
        );

        let mut params: Vec<rusqlite::types::Value> = data.values().map(json_to_sql).collect();
        params.push(json_to_sql(primary_key_value));
        self.conn
            .execute(&sql, rusqlite::params_from_iter(params))
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(())
    }

    async fn delete_row(
        &mut self,
        table_name: &str,
        primary_key: &str,
        primary_key_value: &Value,
    ) -> Result<(), DataError> {
        validate_identifier(table_name)?;
        validate_identifier(primary_key)?;
        let sql = format!("DELETE FROM \"{table_name}\" WHERE \"{primary_key}\" = ?1");
        self.conn
            .execute(&sql, [json_to_sql(primary_key_value)])
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(())
    }
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => json!(v),
        ValueRef::Real(v) => json!(v),
        ValueRef::Text(v) => Value::String(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Value::String(hex::encode(v)),
    }
}

fn json_to_sql(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(v) => rusqlite::types::Value::Integer(i64::from(*v)),
        Value::Number(v) => {
            if let Some(int) = v.as_i64() {
                rusqlite::types::Value::Integer(int)
            } else {
                rusqlite::types::Value::Real(v.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(v) => rusqlite::types::Value::Text(v.clone()),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}
