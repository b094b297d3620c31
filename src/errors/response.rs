use axum::{
    response::{IntoResponse, Response, Redirect},
    http::StatusCode,
};
use urlencoding;
use crate::errors::{AppError, PredictionError};

// Converts AppError into the HTTP response a browser or API client sees.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Authentication errors go back to the current view with an inline message
            AppError::Auth(msg) => {
                Redirect::to(&format!("/?error={}", urlencoding::encode(&msg)))
                    .into_response()
            }

            AppError::Store(e) => {
                tracing::error!("Credential store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Credential store unavailable",
                ).into_response()
            }

            AppError::Session(e) => {
                tracing::error!("Session failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Session error",
                ).into_response()
            }

            AppError::File(e) => {
                tracing::error!("File failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("File error: {}", e),
                ).into_response()
            }

            AppError::Upload(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Upload error: {}", msg),
            ).into_response(),

            AppError::InputCount { expected, received } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Expected exactly {} files, received {}", expected, received),
            ).into_response(),

            AppError::Prediction(err) => convert_prediction_error(err),

            AppError::TaskPanic(msg) => {
                tracing::error!("Background task panicked: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                ).into_response()
            }
        }
    }
}

// Timeouts keep their own status; every other pipeline failure is the client's input
fn convert_prediction_error(err: PredictionError) -> Response {
    match err {
        PredictionError::Timeout(seconds) => (
            StatusCode::REQUEST_TIMEOUT,
            format!("Prediction timed out after {} seconds", seconds),
        ).into_response(),

        PredictionError::Output(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error writing predictions: {}", msg),
        ).into_response(),

        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Error during prediction: {}", err),
        ).into_response(),
    }
}
