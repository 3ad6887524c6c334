use crate::config::OnnxConfig;
use crate::utils::error::ClassifyError;
use crate::Result;
use ndarray::{Array4, ArrayD};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
    inputs,
};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// 预训练模型：批量张量 -> 原始输出
///
/// `forward` 是同步且可能较慢的调用，由调用方负责放到非阻塞的执行上下文中。
pub trait RiskModel: Send + Sync {
    fn forward(&self, input: &Array4<f32>) -> Result<ArrayD<f32>>;

    /// 用于日志与统计的模型描述
    fn describe(&self) -> String;
}

/// ONNX Runtime 后端
pub struct OnnxRiskModel {
    session: Mutex<Session>,
    model_path: PathBuf,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxRiskModel {
    pub fn load(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelLoad(
                format!("Model not found: {}", model_path.display())
            ));
        }

        tracing::info!("Loading risk model from: {}", model_path.display());

        let load_error = |e: ort::Error| {
            ClassifyError::ModelLoad(format!("{}: {}", model_path.display(), e))
        };

        let session = Session::builder()
            .map_err(load_error)?
            .with_optimization_level(optimization_level(onnx_config.optimization_level))
            .map_err(load_error)?
            .with_intra_threads(onnx_config.intra_threads)
            .map_err(load_error)?
            .commit_from_file(model_path)
            .map_err(load_error)?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad("Model has no inputs".to_string()));
            }
        };

        // 动态发现输出名称
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad("Model has no outputs".to_string()));
            }
        };

        tracing::info!("Risk model input: '{}', output: '{}'", input_name, output_name);
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Risk model output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
            input_name,
            output_name,
        })
    }
}

impl RiskModel for OnnxRiskModel {
    fn forward(&self, input: &Array4<f32>) -> Result<ArrayD<f32>> {
        let input_tensor = Tensor::from_array(input.clone())
            .map_err(|e| ClassifyError::Inference(format!("Failed to build input tensor: {}", e)))?;

        // 会话需要可变借用，推理期间持有锁，结果立即复制出来
        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        match outputs.get(self.output_name.as_str()) {
            Some(output) => Ok(output
                .try_extract_array::<f32>()
                .map_err(|e| ClassifyError::Inference(e.to_string()))?
                .into_owned()),
            None => {
                let available_outputs: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                Err(ClassifyError::Inference(format!(
                    "Model output '{}' not found. Available outputs: {:?}",
                    self.output_name, available_outputs
                )))
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "onnx:{} ({} -> {})",
            self.model_path.display(),
            self.input_name,
            self.output_name
        )
    }
}

fn optimization_level(level: i32) -> GraphOptimizationLevel {
    match level {
        i32::MIN..=0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_model_load_error() {
        let result = OnnxRiskModel::load(Path::new("/nonexistent/model.onnx"), &OnnxConfig::for_cores(4));
        match result {
            Err(ClassifyError::ModelLoad(msg)) => assert!(msg.contains("not found")),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected model load failure"),
        }
    }

    #[test]
    fn test_corrupt_model_is_model_load_error() {
        let path = std::env::temp_dir().join(format!("scalp-monitor-corrupt-{}.onnx", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not an onnx graph").unwrap();

        let result = OnnxRiskModel::load(&path, &OnnxConfig::for_cores(1));
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(ClassifyError::ModelLoad(_))));
    }

    #[test]
    fn test_optimization_level_mapping() {
        assert!(matches!(optimization_level(0), GraphOptimizationLevel::Disable));
        assert!(matches!(optimization_level(3), GraphOptimizationLevel::Level3));
        assert!(matches!(optimization_level(9), GraphOptimizationLevel::Level3));
    }
}
