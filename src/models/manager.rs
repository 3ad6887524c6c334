use crate::classify::RiskClassifier;
use crate::models::{OnnxRiskModel, RiskModel};
use crate::{ClassifierConfig, Config, Result};
use serde::Serialize;
use std::sync::Arc;

/// 进程级模型句柄：启动时构建一次，之后只读共享
#[derive(Clone)]
pub struct ModelManager {
    classifier: Arc<RiskClassifier>,
    stats: ModelStats,
}

impl ModelManager {
    /// 按配置加载 ONNX 模型
    pub fn init(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model manager...");

        let model = OnnxRiskModel::load(&config.model_path, &config.onnx_config)?;
        let manager = Self::with_model(
            Arc::new(model),
            &config.classifier,
            config.onnx_config.intra_threads,
            config.onnx_config.optimization_level,
        )?;

        tracing::info!("Model manager initialized successfully");
        Ok(manager)
    }

    /// 使用已构建的模型（测试或其他后端）
    pub fn with_model(
        model: Arc<dyn RiskModel>,
        classifier_config: &ClassifierConfig,
        intra_threads: usize,
        optimization_level: i32,
    ) -> Result<Self> {
        let classifier = RiskClassifier::new(model, classifier_config)?;

        let stats = ModelStats {
            model: classifier.model_description(),
            classifier: classifier.config(),
            intra_threads,
            optimization_level,
        };

        Ok(Self {
            classifier: Arc::new(classifier),
            stats,
        })
    }

    /// 获取分类器引用
    pub fn classifier(&self) -> Arc<RiskClassifier> {
        Arc::clone(&self.classifier)
    }

    /// 模型健康检查：重新执行一次全零张量推理。同步调用，可能较慢。
    pub fn health_check(&self) -> Result<()> {
        match self.classifier.warm_up() {
            Ok(()) => {
                tracing::debug!("Model health check passed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Model health check failed: {}", e);
                Err(e)
            }
        }
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> &ModelStats {
        &self.stats
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub model: String,
    pub classifier: ClassifierConfig,
    pub intra_threads: usize,
    pub optimization_level: i32,
}
