use serde::Serialize;

/// 风险标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLabel {
    Healthy,
    VerySafe,
    Safe,
    Risky,
    VeryRisky,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Healthy => "healthy",
            RiskLabel::VerySafe => "very-safe",
            RiskLabel::Safe => "safe",
            RiskLabel::Risky => "risky",
            RiskLabel::VeryRisky => "very-risky",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 显示颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeColor {
    Blue,
    Green,
    Orange,
    Red,
}

impl GradeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeColor::Blue => "blue",
            GradeColor::Green => "green",
            GradeColor::Orange => "orange",
            GradeColor::Red => "red",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            GradeColor::Blue => (0, 0, 255),
            GradeColor::Green => (0, 128, 0),
            GradeColor::Orange => (255, 165, 0),
            GradeColor::Red => (255, 0, 0),
        }
    }
}

/// 标签 + 显示文本 + 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grade {
    pub label: RiskLabel,
    pub text: &'static str,
    pub color: GradeColor,
}

impl Grade {
    const fn new(label: RiskLabel, text: &'static str, color: GradeColor) -> Self {
        Self { label, text, color }
    }
}

/// 阈值预设
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPreset {
    /// p > 0.8 → 风险，否则健康
    Binary,
    /// p ≥ 0.6 → 风险，否则安全
    SafeRisky,
    /// ≤0.2 / ≤0.6 / ≤0.8 / 其余
    FourLevel,
}

const BINARY_RISKY: Grade = Grade::new(RiskLabel::Risky, "위험할 수도,,", GradeColor::Red);
const BINARY_HEALTHY: Grade = Grade::new(RiskLabel::Healthy, "건강해요:)", GradeColor::Green);

const TWO_LEVEL_RISKY: Grade = Grade::new(RiskLabel::Risky, "위험해요", GradeColor::Red);
const TWO_LEVEL_SAFE: Grade = Grade::new(RiskLabel::Safe, "안전해요", GradeColor::Green);

const FOUR_LEVEL: [Grade; 4] = [
    Grade::new(RiskLabel::VeryRisky, "매우위험", GradeColor::Red),
    Grade::new(RiskLabel::Risky, "위험", GradeColor::Orange),
    Grade::new(RiskLabel::Safe, "안전", GradeColor::Green),
    Grade::new(RiskLabel::VerySafe, "매우안전", GradeColor::Blue),
];

impl ThresholdPreset {
    pub const ALL: [ThresholdPreset; 3] = [
        ThresholdPreset::Binary,
        ThresholdPreset::SafeRisky,
        ThresholdPreset::FourLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThresholdPreset::Binary => "binary",
            ThresholdPreset::SafeRisky => "safe-risky",
            ThresholdPreset::FourLevel => "four-level",
        }
    }

    /// 概率 -> 等级。边界值精确比较，不做容差处理。
    ///
    /// 调用方需保证 `probability` 已截断到 [0, 1]。
    pub fn grade(&self, probability: f32) -> Grade {
        match self {
            ThresholdPreset::Binary => {
                if probability > 0.8 { BINARY_RISKY } else { BINARY_HEALTHY }
            }
            ThresholdPreset::SafeRisky => {
                if probability >= 0.6 { TWO_LEVEL_RISKY } else { TWO_LEVEL_SAFE }
            }
            ThresholdPreset::FourLevel => {
                if probability <= 0.2 {
                    FOUR_LEVEL[3]
                } else if probability <= 0.6 {
                    FOUR_LEVEL[2]
                } else if probability <= 0.8 {
                    FOUR_LEVEL[1]
                } else {
                    FOUR_LEVEL[0]
                }
            }
        }
    }

    pub fn label(&self, probability: f32) -> RiskLabel {
        self.grade(probability).label
    }

    /// 该预设的全部等级，从高风险到低风险
    pub fn scale(&self) -> Vec<Grade> {
        match self {
            ThresholdPreset::Binary => vec![BINARY_RISKY, BINARY_HEALTHY],
            ThresholdPreset::SafeRisky => vec![TWO_LEVEL_RISKY, TWO_LEVEL_SAFE],
            ThresholdPreset::FourLevel => FOUR_LEVEL.to_vec(),
        }
    }
}

impl std::fmt::Display for ThresholdPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep(from: f32, to: f32) -> impl Iterator<Item = f32> {
        (0..=1000).map(move |i| from + (to - from) * i as f32 / 1000.0)
    }

    #[test]
    fn test_four_level_very_safe() {
        for p in sweep(0.0, 0.2) {
            assert_eq!(ThresholdPreset::FourLevel.label(p), RiskLabel::VerySafe, "p={}", p);
        }
        assert_eq!(ThresholdPreset::FourLevel.label(0.2), RiskLabel::VerySafe);
    }

    #[test]
    fn test_four_level_safe() {
        assert_eq!(ThresholdPreset::FourLevel.label(0.200_001), RiskLabel::Safe);
        assert_eq!(ThresholdPreset::FourLevel.label(0.4), RiskLabel::Safe);
        assert_eq!(ThresholdPreset::FourLevel.label(0.6), RiskLabel::Safe);
    }

    #[test]
    fn test_four_level_risky() {
        assert_eq!(ThresholdPreset::FourLevel.label(0.600_001), RiskLabel::Risky);
        assert_eq!(ThresholdPreset::FourLevel.label(0.7), RiskLabel::Risky);
        assert_eq!(ThresholdPreset::FourLevel.label(0.8), RiskLabel::Risky);
    }

    #[test]
    fn test_four_level_very_risky() {
        assert_eq!(ThresholdPreset::FourLevel.label(0.800_001), RiskLabel::VeryRisky);
        for p in sweep(0.81, 1.0) {
            assert_eq!(ThresholdPreset::FourLevel.label(p), RiskLabel::VeryRisky, "p={}", p);
        }
    }

    #[test]
    fn test_binary_boundary_is_strict() {
        assert_eq!(ThresholdPreset::Binary.label(0.8), RiskLabel::Healthy);
        assert_eq!(ThresholdPreset::Binary.label(0.800_000_1), RiskLabel::Risky);
        assert_eq!(ThresholdPreset::Binary.label(0.0), RiskLabel::Healthy);
        assert_eq!(ThresholdPreset::Binary.label(1.0), RiskLabel::Risky);
    }

    #[test]
    fn test_safe_risky_boundary_is_inclusive() {
        assert_eq!(ThresholdPreset::SafeRisky.label(0.6), RiskLabel::Risky);
        assert_eq!(ThresholdPreset::SafeRisky.label(0.5999), RiskLabel::Safe);
    }

    #[test]
    fn test_grade_text_and_colors() {
        let grade = ThresholdPreset::Binary.grade(0.95);
        assert_eq!(grade.text, "위험할 수도,,");
        assert_eq!(grade.color, GradeColor::Red);

        let grade = ThresholdPreset::FourLevel.grade(0.1);
        assert_eq!(grade.text, "매우안전");
        assert_eq!(grade.color, GradeColor::Blue);

        let grade = ThresholdPreset::FourLevel.grade(0.7);
        assert_eq!(grade.color, GradeColor::Orange);
    }

    #[test]
    fn test_scale_order() {
        let texts: Vec<&str> = ThresholdPreset::FourLevel.scale().iter().map(|g| g.text).collect();
        assert_eq!(texts, vec!["매우위험", "위험", "안전", "매우안전"]);
    }
}
