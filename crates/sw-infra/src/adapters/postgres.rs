use crate::adapters::{ColumnInfo, DatabaseAdapter, TableData, TableInfo, validate_identifier};
use serde_json::{Map, Value, json};
use sw_core::error::DataError;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};

pub struct PostgresAdapter {
    client: Client,
}

impl PostgresAdapter {
    pub async fn connect(url: &str) -> Result<Self, DataError> {
        let (client, connection) =
            tokio_postgres::connect(url, NoTls)
                .await
                .map_err(|err| DataError::ConnectionFailed {
                    message: err.to_string(),
                })?;
        // The connection task ends when the client is dropped.
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!(%err, "postgres connection closed");
            }
        });
        Ok(Self { client })
    }

    async fn count_rows(&self, table_name: &str) -> Result<u64, DataError> {
        let row = self
            .client
            .query_one(&format!("SELECT COUNT(*) FROM \"{table_name}\""), &[])
            .await
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn schema(&self, table_name: &str) -> Result<Vec<ColumnInfo>, DataError> {
        validate_identifier(table_name)?;
        let rows = self
            .client
            .query(
                "SELECT
                     c.column_name,
                     c.data_type,
                     c.is_nullable,
                     CASE WHEN tc.constraint_type = 'PRIMARY KEY' THEN true ELSE false END AS is_pk
                 FROM information_schema.columns c
                 LEFT JOIN information_schema.key_column_usage kcu
                   ON c.table_name = kcu.table_name
                   AND c.column_name = kcu.column_name
                   AND c.table_schema = kcu.table_schema
                 LEFT JOIN information_schema.table_constraints tc
                   ON kcu.constraint_name = tc.constraint_name
                   AND kcu.table_schema = tc.table_schema
                   AND tc.constraint_type = 'PRIMARY KEY'
                 WHERE c.table_name = $1
                   AND c.table_schema = 'public'
                 ORDER BY c.ordinal_position",
                &[&table_name],
            )
            .await
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;

        Ok(rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get(0),
                column_type: row.get(1),
                nullable: row.get::<_, String>(2) == "YES",
                primary_key: row.get(3),
            })
            .collect())
    }

    async fn query_json(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Value>, DataError> {
        let rows = self
            .client
            .query(sql, params)
            .await
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

impl DatabaseAdapter for PostgresAdapter {
    async fn get_tables(&mut self) -> Result<Vec<TableInfo>, DataError> {
        let rows = self
            .client
            .query(
                "SELECT table_name FROM information_schema.tables
                 WHERE table_schema = 'public'
                   AND table_type = 'BASE TABLE'
                   AND table_name NOT LIKE '\\_app\\_%'
                 ORDER BY table_name",
                &[],
            )
            .await
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;

        let mut tables = Vec::new();
        for row in rows {
            let name: String = row.get(0);
            let row_count = self.count_rows(&name).await?;
            tables.push(TableInfo { name, row_count });
        }
        Ok(tables)
    }

    async fn get_table_schema(&mut self, table_name: &str) -> Result<Vec<ColumnInfo>, DataError> {
        self.schema(table_name).await
    }

    async fn get_table_data(
        &mut self,
        table_name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TableData, DataError> {
        let columns = self.schema(table_name).await?;
        let total = self.count_rows(table_name).await?;
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let limit = i64::from(page_size);
        let rows = self
            .query_json(
                &format!("SELECT * FROM \"{table_name}\" LIMIT $1 OFFSET $2"),
                &[&limit, &offset],
            )
            .await?;
        Ok(TableData {
            columns,
            rows,
            total,
            page,
            page_size,
        })
    }

    async fn execute_query(&mut self, query: &str) -> Result<Vec<Value>, DataError> {
        self.query_json(query, &[]).await
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
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO \"{table_name}\" ({columns}) VALUES ({placeholders})");

        let values: Vec<JsonParam> = data.values().map(JsonParam::from).collect();
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        self.client
            .execute(&sql, &params)
            .await
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
            .map(|(i, key)| format!("\"{key}\" = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE \"{table_name}\" SET {set_clause} WHERE \"{primary_key}\" = ${}",
            keys.len() + 1
        );

        let mut values: Vec<JsonParam> = data.values().map(JsonParam::from).collect();
        values.push(JsonParam::from(primary_key_value));
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        self.client
            .execute(&sql, &params)
            .await
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
        let sql = format!("DELETE FROM \"{table_name}\" WHERE \"{primary_key}\" = $1");
        let value = JsonParam::from(primary_key_value);
        self.client
            .execute(&sql, &[&value])
            .await
            .map_err(|err| DataError::QueryFailed {
                message: err.to_string(),
            })?;
        Ok(())
    }
}

/// JSON value adapted to a postgres parameter. Numbers bind as int8/float8,
/// everything structured binds as jsonb.
#[derive(Debug)]
enum JsonParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl From<&Value> for JsonParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Number(v) => {
                if let Some(int) = v.as_i64() {
                    Self::Int(int)
                } else {
                    Self::Float(v.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(v) => Self::Text(v.clone()),
            other => Self::Json(other.clone()),
        }
    }
}

impl ToSql for JsonParam {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut tokio_postgres::types::private::BytesMut,
    ) -> Result<tokio_postgres::types::IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Self::Null => Ok(tokio_postgres::types::IsNull::Yes),
            Self::Bool(v) => v.to_sql(ty, out),
            Self::Int(v) => v.to_sql(ty, out),
            Self::Float(v) => v.to_sql(ty, out),
            Self::Text(v) => v.to_sql(ty, out),
            Self::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn row_to_json(row: &Row) -> Value {
    let mut object = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(index)
                .map(|v| v.map_or(Value::Null, Value::Bool))
        } else if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(index)
                .map(|v| v.map_or(Value::Null, |v| json!(v)))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(index)
                .map(|v| v.map_or(Value::Null, |v| json!(v)))
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(index)
                .map(|v| v.map_or(Value::Null, |v| json!(v)))
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(index)
                .map(|v| v.map_or(Value::Null, |v| json!(v)))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(index)
                .map(|v| v.map_or(Value::Null, |v| json!(v)))
        } else if *ty == Type::JSON || *ty == Type::JSONB {
            row.try_get::<_, Option<Value>>(index)
                .map(|v| v.unwrap_or(Value::Null))
        } else if *ty == Type::TIMESTAMPTZ {
            row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)
                .map(|v| v.map_or(Value::Null, |v| Value::String(v.to_rfc3339())))
        } else if *ty == Type::TIMESTAMP {
            row.try_get::<_, Option<chrono::NaiveDateTime>>(index)
                .map(|v| v.map_or(Value::Null, |v| Value::String(v.to_string())))
        } else {
            row.try_get::<_, Option<String>>(index)
                .map(|v| v.map_or(Value::Null, Value::String))
        };
        object.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }
    Value::Object(object)
}
