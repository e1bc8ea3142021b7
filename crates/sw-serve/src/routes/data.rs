use crate::middleware::correlation::CorrelationId;
use crate::routes::{error::map_error, load_project};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};
use sw_infra::browser::DEFAULT_PAGE_SIZE;
use sw_infra::adapters::{ColumnInfo, TableData, TableInfo};
use utoipa::{IntoParams, ToSchema};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/projects/{id}/data/tables", get(get_tables))
        .route(
            "/projects/{id}/data/tables/{table}/schema",
            get(get_table_schema),
        )
        .route(
            "/projects/{id}/data/tables/{table}/rows",
            get(get_table_data).post(insert_row),
        )
        .route(
            "/projects/{id}/data/tables/{table}/rows/{pk}",
            put(update_row).delete(delete_row),
        )
        .route("/projects/{id}/data/query", post(execute_query))
        .with_state(state)
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    pub query: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRowInput {
    pub pk_column: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PkColumnQuery {
    pub pk_column: String,
}

/// Path segments are always strings; integer keys need their numeric form
/// back before binding.
fn coerce_pk(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(value) => Value::Number(value.into()),
        Err(_) => Value::String(raw.to_string()),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/data/tables",
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, body = Vec<TableInfo>))
)]
pub(crate) async fn get_tables(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.browser.get_tables(&project).await {
        Ok(tables) => Json(tables).into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/data/tables/{table}/schema",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("table" = String, Path, description = "Table name")
    ),
    responses((status = 200, body = Vec<ColumnInfo>))
)]
pub(crate) async fn get_table_schema(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, table)): Path<(String, String)>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.browser.get_table_schema(&project, &table).await {
        Ok(columns) => Json(columns).into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/data/tables/{table}/rows",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("table" = String, Path, description = "Table name"),
        PageQuery
    ),
    responses((status = 200, body = TableData))
)]
pub(crate) async fn get_table_data(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, table)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state
        .browser
        .get_table_data(&project, &table, page.page, page.page_size)
        .await
    {
        Ok(data) => Json(data).into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/data/query",
    request_body = QueryInput,
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, description = "Result rows"), (status = 400))
)]
pub(crate) async fn execute_query(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    Json(input): Json<QueryInput>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.browser.execute_query(&project, &input.query).await {
        Ok(rows) => Json(rows).into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/data/tables/{table}/rows",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("table" = String, Path, description = "Table name")
    ),
    responses((status = 204))
)]
pub(crate) async fn insert_row(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, table)): Path<(String, String)>,
    Json(data): Json<Map<String, Value>>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.browser.insert_row(&project, &table, &data).await {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/projects/{id}/data/tables/{table}/rows/{pk}",
    request_body = UpdateRowInput,
    params(
        ("id" = String, Path, description = "Project ID"),
        ("table" = String, Path, description = "Table name"),
        ("pk" = String, Path, description = "Primary key value")
    ),
    responses((status = 204))
)]
pub(crate) async fn update_row(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, table, pk)): Path<(String, String, String)>,
    Json(input): Json<UpdateRowInput>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let pk_value = coerce_pk(&pk);
    match state
        .browser
        .update_row(&project, &table, &input.pk_column, &pk_value, &input.data)
        .await
    {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}/data/tables/{table}/rows/{pk}",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("table" = String, Path, description = "Table name"),
        ("pk" = String, Path, description = "Primary key value"),
        PkColumnQuery
    ),
    responses((status = 204))
)]
pub(crate) async fn delete_row(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, table, pk)): Path<(String, String, String)>,
    Query(query): Query<PkColumnQuery>,
) -> Response {
    let project = match load_project(&state, &id) {
        Ok(project) => project,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let pk_value = coerce_pk(&pk);
    match state
        .browser
        .delete_row(&project, &table, &query.pk_column, &pk_value)
        .await
    {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err.into(), Some(correlation.0)).into_response(),
    }
}
