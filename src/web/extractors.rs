use crate::utils::error::ClassifyError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// 上传表单中的图像字段名
pub const FILE_FIELD: &str = "file";

/// multipart 上传的图像
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// 上传解析失败的原因
#[derive(Debug)]
pub enum UploadRejection {
    NoFilePart,
    NoSelectedFile,
    EmptyFile,
    Multipart(String),
}

impl UploadRejection {
    pub fn message(&self) -> String {
        match self {
            UploadRejection::NoFilePart => "No file part".to_string(),
            UploadRejection::NoSelectedFile => "No selected file".to_string(),
            UploadRejection::EmptyFile => "Empty file".to_string(),
            UploadRejection::Multipart(msg) => format!("Failed to read upload: {}", msg),
        }
    }
}

impl From<UploadRejection> for ClassifyError {
    fn from(rejection: UploadRejection) -> Self {
        ClassifyError::InvalidInput(rejection.message())
    }
}

impl IntoResponse for UploadRejection {
    fn into_response(self) -> Response {
        ClassifyError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = UploadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| UploadRejection::Multipart(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadRejection::Multipart(e.body_text()))?
        {
            let field_name = field.name().unwrap_or("unknown").to_string();
            if field_name != FILE_FIELD {
                tracing::debug!("Ignoring unknown field: {}", field_name);
                continue;
            }

            let file_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());

            // 浏览器未选择文件时会提交空文件名
            if file_name.as_deref() == Some("") {
                return Err(UploadRejection::NoSelectedFile);
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| UploadRejection::Multipart(e.body_text()))?;

            if bytes.is_empty() {
                return Err(UploadRejection::EmptyFile);
            }

            tracing::debug!(
                "Received file: name={:?}, content_type={:?}, {} bytes",
                file_name,
                content_type,
                bytes.len()
            );

            return Ok(ImageUpload {
                file_name,
                content_type,
                bytes,
            });
        }

        Err(UploadRejection::NoFilePart)
    }
}

/// 请求ID提取器
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .headers
            .get("X-Request-ID")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(RequestId(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(UploadRejection::NoFilePart.message(), "No file part");
        assert_eq!(UploadRejection::NoSelectedFile.message(), "No selected file");
        let err: ClassifyError = UploadRejection::EmptyFile.into();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
