use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use bays::UpstreamError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Search query is required")]
    MissingQuery,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Failed to fetch parking bays data")]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingQuery => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let AppError::Upstream(err) = &self {
            body["message"] = json!(err.to_string());
        }

        (status, Json(body)).into_response()
    }
}
