pub mod manager;
pub mod output;
pub mod risk_model;

pub use manager::{ModelManager, ModelStats};
pub use output::OutputConvention;
pub use risk_model::{OnnxRiskModel, RiskModel};
