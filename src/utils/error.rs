use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ClassifyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ClassifyError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClassifyError::Json(_) => StatusCode::BAD_REQUEST,
            ClassifyError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ClassifyError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            ClassifyError::InvalidImage(_) => "INVALID_IMAGE",
            ClassifyError::Inference(_) => "INFERENCE_ERROR",
            ClassifyError::InvalidInput(_) => "INVALID_INPUT",
            ClassifyError::Config(_) => "CONFIG_ERROR",
            ClassifyError::Io(_) => "IO_ERROR",
            ClassifyError::Json(_) => "JSON_ERROR",
            ClassifyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 该错误是否由用户输入引起（而非服务端故障）
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<image::ImageError> for ClassifyError {
    fn from(err: image::ImageError) -> Self {
        ClassifyError::InvalidImage(err.to_string())
    }
}

impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ClassifyError::InvalidImage("bad".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ClassifyError::ModelLoad("missing".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ClassifyError::Inference("shape".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(ClassifyError::InvalidInput("empty".into()).is_client_error());
        assert!(!ClassifyError::Internal("panic".into()).is_client_error());
    }

    #[test]
    fn test_image_error_maps_to_invalid_image() {
        let err = image::load_from_memory(b"definitely not an image").unwrap_err();
        let err: ClassifyError = err.into();
        assert_eq!(err.error_code(), "INVALID_IMAGE");
    }
}
