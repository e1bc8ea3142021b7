use crate::middleware::correlation::CorrelationId;
use crate::routes::error::map_error;
use crate::sse;
use crate::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use sw_core::error::ReviewError;
use sw_core::types::{MessageId, ProjectId, Review, ReviewId, ToolActivity};
use sw_core::{BuildCompleteEvent, ShipwrightError, TriggeredReview};
use utoipa::ToSchema;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/projects/{id}/build-complete", post(build_complete))
        .route("/projects/{id}/reviews/trigger", post(trigger_review))
        .route("/projects/{id}/reviews", get(list_reviews))
        .route(
            "/projects/{id}/reviews/{review_id}",
            get(get_review),
        )
        .route("/projects/{id}/reviews/subscribe", get(subscribe))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildCompleteInput {
    pub message_id: String,
    #[serde(default)]
    pub tool_activities: Vec<ToolActivity>,
}

fn parse_project_id(id: String) -> Result<ProjectId, ShipwrightError> {
    ProjectId::new(id).map_err(|err| {
        ShipwrightError::Review(ReviewError::InvalidInput {
            message: err.to_string(),
        })
    })
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/build-complete",
    request_body = BuildCompleteInput,
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 204))
)]
pub(crate) async fn build_complete(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
    Json(input): Json<BuildCompleteInput>,
) -> Response {
    let project_id = match parse_project_id(id) {
        Ok(value) => value,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let message_id = match MessageId::new(input.message_id) {
        Ok(value) => value,
        Err(err) => {
            return map_error(
                &ShipwrightError::Review(ReviewError::InvalidInput {
                    message: err.to_string(),
                }),
                Some(correlation.0),
            )
            .into_response();
        }
    };
    let event = BuildCompleteEvent {
        project_id,
        message_id,
        tool_activities: input.tool_activities,
    };
    match state.architect.handle_build_complete(event).await {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/reviews/trigger",
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, body = TriggeredReview))
)]
pub(crate) async fn trigger_review(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let project_id = match parse_project_id(id) {
        Ok(value) => value,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.architect.trigger_review(&project_id, None).await {
        Ok(triggered) => Json(triggered).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/reviews",
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, body = Vec<Review>))
)]
pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path(id): Path<String>,
) -> Response {
    let project_id = match parse_project_id(id) {
        Ok(value) => value,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    match state.architect.list_reviews(&project_id) {
        Ok(reviews) => Json(reviews).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/reviews/{review_id}",
    params(
        ("id" = String, Path, description = "Project ID"),
        ("review_id" = String, Path, description = "Review ID")
    ),
    responses((status = 200, body = Review), (status = 404))
)]
pub(crate) async fn get_review(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Path((id, review_id)): Path<(String, String)>,
) -> Response {
    let project_id = match parse_project_id(id) {
        Ok(value) => value,
        Err(err) => return map_error(&err, Some(correlation.0)).into_response(),
    };
    let review_id = match ReviewId::new(review_id) {
        Ok(value) => value,
        Err(err) => {
            return map_error(
                &ShipwrightError::Review(ReviewError::InvalidInput {
                    message: err.to_string(),
                }),
                Some(correlation.0),
            )
            .into_response();
        }
    };
    match state.architect.get_review(&project_id, &review_id) {
        Ok(review) => Json(review).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}/reviews/subscribe",
    params(("id" = String, Path, description = "Project ID")),
    responses((status = 200, description = "SSE stream of review events"))
)]
pub(crate) async fn subscribe(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let project_id = match parse_project_id(id) {
        Ok(value) => value,
        Err(err) => return map_error(&err, None).into_response(),
    };
    sse::subscribe(&state, &project_id).await
}
