use crate::{
    classify::{Assessment, AssessmentReport, RiskClassifier},
    utils::error::ClassifyError,
    web::{
        extractors::{ImageUpload, RequestId, UploadRejection},
        pages::{self, DashboardOutcome, FormOutcome},
        AppState,
    },
    Result,
};
use axum::{
    body::Bytes,
    extract::State,
    response::{Html, Json},
};
use serde::Serialize;
use std::sync::Arc;

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 在阻塞线程池中执行分类，避免阻塞异步运行时
pub async fn assess_blocking(classifier: Arc<RiskClassifier>, bytes: Bytes) -> Result<Assessment> {
    tokio::task::spawn_blocking(move || classifier.assess_bytes(&bytes))
        .await
        .map_err(|e| ClassifyError::Internal(format!("Classification task failed: {}", e)))?
}

/// Web表单首页
pub async fn form_page() -> Html<String> {
    Html(pages::render_form(&FormOutcome::Empty))
}

/// Web表单提交
pub async fn form_submit(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    upload: std::result::Result<ImageUpload, UploadRejection>,
) -> Html<String> {
    let upload = match upload {
        Ok(upload) => upload,
        Err(rejection) => {
            tracing::info!("Form upload rejected: request_id={}, {}", request_id, rejection.message());
            return Html(pages::render_form(&FormOutcome::Notice(rejection.message())));
        }
    };

    let outcome = match assess_blocking(state.models.classifier(), upload.bytes).await {
        Ok(assessment) => {
            let grade = assessment.grade(state.config.form_preset);
            tracing::info!(
                "Form classification completed: request_id={}, probability={:.4}, label={}, time={:.3}s",
                request_id,
                assessment.probability.value(),
                grade.label,
                assessment.elapsed.as_secs_f32()
            );
            FormOutcome::Prediction(grade.text.to_string())
        }
        Err(e) => {
            log_failure(&request_id, &e);
            FormOutcome::Error(e.to_string())
        }
    };

    Html(pages::render_form(&outcome))
}

/// 仪表盘首页
pub async fn dashboard_page() -> Html<String> {
    Html(pages::render_dashboard(&DashboardOutcome::Empty))
}

/// 仪表盘提交
pub async fn dashboard_submit(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    upload: std::result::Result<ImageUpload, UploadRejection>,
) -> Html<String> {
    let upload = match upload {
        Ok(upload) => upload,
        Err(rejection) => {
            return Html(pages::render_dashboard(&DashboardOutcome::Error(rejection.message())));
        }
    };

    let image = upload.bytes.clone();
    let html = match assess_blocking(state.models.classifier(), upload.bytes).await {
        Ok(assessment) => {
            tracing::info!(
                "Dashboard classification completed: request_id={}, probability={:.4}, time={:.3}s",
                request_id,
                assessment.probability.value(),
                assessment.elapsed.as_secs_f32()
            );
            pages::render_dashboard(&DashboardOutcome::Assessed {
                image: &image,
                assessment: &assessment,
                preset: state.config.dashboard_preset,
            })
        }
        Err(e) => {
            log_failure(&request_id, &e);
            pages::render_dashboard(&DashboardOutcome::Error(e.to_string()))
        }
    };

    Html(html)
}

/// JSON API：multipart 上传，返回全部预设下的等级
pub async fn classify_api_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    upload: ImageUpload,
) -> Result<Json<ApiResponse<AssessmentReport>>> {
    tracing::info!("Processing classify request: request_id={}", request_id);

    let assessment = assess_blocking(state.models.classifier(), upload.bytes).await?;

    tracing::info!(
        "Classify request completed: request_id={}, probability={:.4}, time={:.3}s",
        request_id,
        assessment.probability.value(),
        assessment.elapsed.as_secs_f32()
    );

    Ok(Json(ApiResponse::success(assessment.report(), request_id)))
}

fn log_failure(request_id: &str, err: &ClassifyError) {
    if err.is_client_error() {
        tracing::warn!("Classification rejected: request_id={}, {}", request_id, err);
    } else {
        tracing::error!("Classification failed: request_id={}, {}", request_id, err);
    }
}
