pub mod config;
pub mod models;
pub mod image;
pub mod classify;
pub mod web;
pub mod desktop;
pub mod utils;

// 重新导出主要类型
pub use classify::{Assessment, Grade, RiskClassifier, RiskLabel, ThresholdPreset};
pub use config::{ClassifierConfig, Config};
pub use utils::error::ClassifyError;

pub type Result<T> = std::result::Result<T, ClassifyError>;
