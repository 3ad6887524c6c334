use crate::classify::thresholds::{Grade, ThresholdPreset};
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;
use std::time::Duration;

/// 截断到 [0, 1] 的风险概率
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Probability(f32);

impl Probability {
    /// 截断到 [0, 1]；NaN 视为推理失败
    pub fn clamped(value: f32) -> Result<Self> {
        if value.is_nan() {
            return Err(ClassifyError::Inference("Model produced NaN".to_string()));
        }
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

/// 单张图像的分类结果
#[derive(Debug, Clone, Copy)]
pub struct Assessment {
    /// 截断后的概率
    pub probability: Probability,
    /// 输出约定转换后、截断前的分数
    pub raw_score: f32,
    /// 预处理 + 推理耗时
    pub elapsed: Duration,
}

impl Assessment {
    pub fn grade(&self, preset: ThresholdPreset) -> Grade {
        preset.grade(self.probability.value())
    }

    pub fn report(&self) -> AssessmentReport {
        AssessmentReport {
            probability: self.probability.value(),
            raw_score: self.raw_score,
            processing_time: self.elapsed.as_secs_f32(),
            grades: ThresholdPreset::ALL
                .iter()
                .map(|preset| PresetGrade {
                    preset: *preset,
                    grade: self.grade(*preset),
                })
                .collect(),
        }
    }
}

/// API 返回的分类报告
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub probability: f32,
    pub raw_score: f32,
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub grades: Vec<PresetGrade>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresetGrade {
    pub preset: ThresholdPreset,
    #[serde(flatten)]
    pub grade: Grade,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RiskLabel;

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(Probability::clamped(1.7).unwrap().value(), 1.0);
        assert_eq!(Probability::clamped(-0.3).unwrap().value(), 0.0);
        assert_eq!(Probability::clamped(0.42).unwrap().value(), 0.42);
        assert!(Probability::clamped(f32::NAN).is_err());
    }

    #[test]
    fn test_out_of_range_output_uses_clamped_value() {
        let assessment = Assessment {
            probability: Probability::clamped(3.5).unwrap(),
            raw_score: 3.5,
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(assessment.grade(ThresholdPreset::FourLevel).label, RiskLabel::VeryRisky);

        let report = assessment.report();
        assert_eq!(report.probability, 1.0);
        assert_eq!(report.grades.len(), 3);
    }

    #[test]
    fn test_report_serialization() {
        let assessment = Assessment {
            probability: Probability::clamped(0.1).unwrap(),
            raw_score: 0.1,
            elapsed: Duration::from_millis(1),
        };
        let json = serde_json::to_value(assessment.report()).unwrap();
        assert_eq!(json["grades"][0]["preset"], "binary");
        assert_eq!(json["grades"][0]["label"], "healthy");
        assert_eq!(json["grades"][2]["label"], "very-safe");
        assert_eq!(json["grades"][2]["color"], "blue");
    }
}
