//! 终端版桌面前端：在工作线程中分类，主线程显示进度与结果。

use crate::classify::{Assessment, Grade, RiskClassifier, RiskLabel, ThresholdPreset};
use crate::utils::error::ClassifyError;
use crate::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub struct DesktopShell {
    classifier: Arc<RiskClassifier>,
    preset: ThresholdPreset,
    show_progress: bool,
}

impl DesktopShell {
    pub fn new(classifier: Arc<RiskClassifier>, preset: ThresholdPreset) -> Self {
        Self {
            classifier,
            preset,
            show_progress: true,
        }
    }

    /// 关闭进度指示（非交互环境）
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// 在工作线程中分类单张图像，当前线程只负责进度显示
    pub fn classify(&self, path: &Path) -> Result<Assessment> {
        let classifier = Arc::clone(&self.classifier);
        let image_path = path.to_path_buf();

        let worker = thread::Builder::new()
            .name("classify-worker".to_string())
            .spawn(move || classifier.assess_path(&image_path))?;

        let spinner = self.show_progress.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message("분류 중...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });

        let result = worker
            .join()
            .map_err(|_| ClassifyError::Internal("Classification worker panicked".to_string()));

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        result?
    }

    /// 依次处理所有图像，返回失败数量。单张失败不影响后续图像。
    pub fn run(&self, paths: &[PathBuf]) -> usize {
        let mut failures = 0;

        for path in paths {
            if paths.len() > 1 {
                println!("{}", path.display().to_string().as_str().dimmed());
            }

            match self.classify(path) {
                Ok(assessment) => {
                    let grade = assessment.grade(self.preset);
                    tracing::info!(
                        "Classified {}: probability={:.4}, label={}, time={:.3}s",
                        path.display(),
                        assessment.probability.value(),
                        grade.label,
                        assessment.elapsed.as_secs_f32()
                    );
                    println!("{}", render_result(&grade));
                    println!("{}", render_scale(self.preset, Some(grade.label)));
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!("Failed to classify {}: {}", path.display(), e);
                    println!("{} {}", "오류:".red().bold(), e);
                    println!("{}", render_scale(self.preset, None));
                }
            }
        }

        failures
    }
}

/// "결과: <등급>"，使用等级颜色
pub fn render_result(grade: &Grade) -> String {
    let (r, g, b) = grade.color.rgb();
    format!("결과: {}", grade.text.truecolor(r, g, b).bold())
}

/// 风险刻度，选中的等级加粗显示
pub fn render_scale(preset: ThresholdPreset, selected: Option<RiskLabel>) -> String {
    let grades: Vec<String> = preset
        .scale()
        .iter()
        .map(|grade| {
            let (r, g, b) = grade.color.rgb();
            let text = grade.text.truecolor(r, g, b);
            if Some(grade.label) == selected {
                text.bold().underline().to_string()
            } else {
                text.to_string()
            }
        })
        .collect();

    format!("위험도: {}", grades.join(" - "))
}
