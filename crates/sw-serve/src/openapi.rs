use crate::routes::data::{QueryInput, UpdateRowInput};
use crate::routes::reviews::BuildCompleteInput;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use sw_core::TriggeredReview;
use sw_core::types::{
    CreateProjectInput, DatabaseConfig, DatabaseProvider, DatabaseState, InfraStatus,
    IssueCategory, IssueSeverity, MessageId, Project, ProjectDatabaseStatus, ProjectId, Review,
    ReviewId, ReviewIssue, ReviewStatus, RuntimeStatus, ToolActivity,
};
use sw_events::{ReviewStreamEvent, ReviewStreamEventKind};
use sw_infra::adapters::{ColumnInfo, TableData, TableInfo};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::projects::create_project,
        crate::routes::projects::get_project,
        crate::routes::reviews::build_complete,
        crate::routes::reviews::trigger_review,
        crate::routes::reviews::list_reviews,
        crate::routes::reviews::get_review,
        crate::routes::reviews::subscribe,
        crate::routes::database::infra_status,
        crate::routes::database::refresh_status,
        crate::routes::database::database_status,
        crate::routes::database::create_database,
        crate::routes::database::start_database,
        crate::routes::database::stop_database,
        crate::routes::database::delete_database,
        crate::routes::data::get_tables,
        crate::routes::data::get_table_schema,
        crate::routes::data::get_table_data,
        crate::routes::data::execute_query,
        crate::routes::data::insert_row,
        crate::routes::data::update_row,
        crate::routes::data::delete_row
    ),
    components(schemas(
        Project,
        CreateProjectInput,
        ToolActivity,
        BuildCompleteInput,
        TriggeredReview,
        Review,
        ReviewIssue,
        ReviewStatus,
        IssueSeverity,
        IssueCategory,
        ReviewStreamEvent,
        ReviewStreamEventKind,
        RuntimeStatus,
        InfraStatus,
        ProjectDatabaseStatus,
        DatabaseConfig,
        DatabaseProvider,
        DatabaseState,
        TableInfo,
        ColumnInfo,
        TableData,
        QueryInput,
        UpdateRowInput,
        ProjectId,
        ReviewId,
        MessageId
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
