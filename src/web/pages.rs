use crate::classify::{Assessment, ThresholdPreset};
use crate::image::ImageLoader;
use base64::Engine;

const FORM_TEMPLATE: &str = include_str!("../../templates/form.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");

/// 表单页面的结果区域
pub enum FormOutcome {
    Empty,
    /// 原样显示的提示（如 "No file part"）
    Notice(String),
    Prediction(String),
    Error(String),
}

/// 渲染Web表单页面
pub fn render_form(outcome: &FormOutcome) -> String {
    let result = match outcome {
        FormOutcome::Empty => String::new(),
        FormOutcome::Notice(message) => {
            format!(r#"<div class="result">{}</div>"#, escape_html(message))
        }
        FormOutcome::Prediction(text) => {
            format!(r#"<div class="result">Prediction: {}</div>"#, escape_html(text))
        }
        FormOutcome::Error(message) => {
            format!(r#"<div class="result error">Error: {}</div>"#, escape_html(message))
        }
    };

    FORM_TEMPLATE.replace("{{result}}", &result)
}

/// 仪表盘页面的结果区域
pub enum DashboardOutcome<'a> {
    Empty,
    Assessed {
        image: &'a [u8],
        assessment: &'a Assessment,
        preset: ThresholdPreset,
    },
    Error(String),
}

/// 渲染仪表盘页面
pub fn render_dashboard(outcome: &DashboardOutcome<'_>) -> String {
    let result = match outcome {
        DashboardOutcome::Empty => String::new(),
        DashboardOutcome::Assessed { image, assessment, preset } => {
            let grade = assessment.grade(*preset);
            format!(
                concat!(
                    r#"<div class="preview"><img src="{}" alt="uploaded scalp image">"#,
                    r#"<p class="caption">업로드된 이미지</p></div>"#,
                    r#"<p><strong>결과:</strong> <span class="label" style="color:{}">{}</span></p>"#,
                    r#"<p><strong>확률:</strong> <span class="probability">{:.2}</span></p>"#,
                ),
                data_url(image),
                grade.color.as_str(),
                escape_html(grade.text),
                assessment.probability.value()
            )
        }
        DashboardOutcome::Error(message) => {
            format!(r#"<div class="error">분류 중 오류 발생: {}</div>"#, escape_html(message))
        }
    };

    DASHBOARD_TEMPLATE.replace("{{result}}", &result)
}

/// 将图像字节编码为内联 data URL
pub fn data_url(bytes: &[u8]) -> String {
    let mime = ImageLoader::detect_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
