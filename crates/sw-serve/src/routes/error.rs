use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use sw_core::error::{
    DataError, InfraError, MessageError, ProjectError, ReviewError, ShipwrightError,
};

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &ShipwrightError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        ShipwrightError::Project(project) => map_project_error(project),
        ShipwrightError::Review(review) => map_review_error(review),
        ShipwrightError::Message(message) => map_message_error(message),
        ShipwrightError::Infra(infra) => map_infra_error(infra),
        ShipwrightError::Data(data) => map_data_error(data),
        ShipwrightError::Agent { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "agent_error",
            message.clone(),
        ),
        ShipwrightError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

fn map_project_error(err: &ProjectError) -> (StatusCode, &'static str, String) {
    match err {
        ProjectError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ProjectError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_review_error(err: &ReviewError) -> (StatusCode, &'static str, String) {
    match err {
        ReviewError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ReviewError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_message_error(err: &MessageError) -> (StatusCode, &'static str, String) {
    match err {
        MessageError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_infra_error(err: &InfraError) -> (StatusCode, &'static str, String) {
    match err {
        InfraError::ContainerFailed { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "container_failed",
            err.to_string(),
        ),
        InfraError::NotReady { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string()),
        InfraError::NoAvailablePort { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            err.to_string(),
        ),
        InfraError::Io { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
        InfraError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
    }
}

fn map_data_error(err: &DataError) -> (StatusCode, &'static str, String) {
    match err {
        DataError::DatabaseNotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        DataError::DestructiveQuery => (
            StatusCode::BAD_REQUEST,
            "destructive_query",
            err.to_string(),
        ),
        DataError::QueryFailed { .. } => {
            (StatusCode::BAD_REQUEST, "query_failed", err.to_string())
        }
        DataError::ConnectionFailed { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}
