pub mod pipeline;
pub mod thresholds;
pub mod types;

pub use pipeline::RiskClassifier;
pub use thresholds::{Grade, GradeColor, RiskLabel, ThresholdPreset};
pub use types::{Assessment, AssessmentReport, PresetGrade, Probability};
