use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("upload too large: {0}")]
    PayloadTooLarge(String),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("model execution failed: {0}")]
    Inference(String),
    #[error("model failed to load: {0}")]
    Startup(String),
    #[error("{0}")]
    Processing(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::Decode(_) => StatusCode::BAD_REQUEST,
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Inference(_)
            | ServiceError::Startup(_)
            | ServiceError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "error processing image");
        } else {
            tracing::warn!(error = %self, "rejected upload");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "success": false,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_passed_through_verbatim() {
        let err = ServiceError::Validation("No image provided".into());
        assert_eq!(err.to_string(), "No image provided");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn model_failures_are_server_errors() {
        assert_eq!(
            ServiceError::Inference("bad shape".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Processing("encode".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn oversized_uploads_map_to_413() {
        let err = ServiceError::PayloadTooLarge("length limit exceeded".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().starts_with("upload too large"));
    }
}
