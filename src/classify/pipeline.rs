use crate::classify::types::{Assessment, Probability};
use crate::config::ClassifierConfig;
use crate::image::{ImageLoader, ImagePreprocessor};
use crate::models::{OutputConvention, RiskModel};
use crate::utils::error::ClassifyError;
use crate::Result;
use image::DynamicImage;
use ndarray::Array4;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 预处理 -> 推理 -> 概率
///
/// 所有前端共享同一个实例，模型只加载一次。
pub struct RiskClassifier {
    model: Arc<dyn RiskModel>,
    preprocessor: ImagePreprocessor,
    output: OutputConvention,
}

impl RiskClassifier {
    /// 构建分类器并用全零张量预热一次，确认模型结构与配置匹配
    pub fn new(model: Arc<dyn RiskModel>, config: &ClassifierConfig) -> Result<Self> {
        let classifier = Self {
            model,
            preprocessor: ImagePreprocessor::new(config.preprocess),
            output: config.output,
        };

        classifier.warm_up().map_err(|e| {
            ClassifyError::ModelLoad(format!(
                "Model does not match the configured input {:?} / output '{}': {}",
                classifier.preprocessor.input_shape(),
                classifier.output.as_str(),
                e
            ))
        })?;

        tracing::info!(
            "Risk classifier ready: model={}, resize={}, normalization={}, layout={}, output={}",
            classifier.model.describe(),
            config.preprocess.resize.as_str(),
            config.preprocess.normalization.as_str(),
            config.preprocess.layout.as_str(),
            config.output.as_str()
        );

        Ok(classifier)
    }

    /// 用全零张量跑一次前向，并按输出约定解析结果
    pub fn warm_up(&self) -> Result<()> {
        let input = Array4::<f32>::zeros(self.preprocessor.input_shape());
        let output = self.model.forward(&input)?;
        self.output.extract(&output)?;
        Ok(())
    }

    pub fn config(&self) -> ClassifierConfig {
        ClassifierConfig::new(*self.preprocessor.config(), self.output)
    }

    pub fn model_description(&self) -> String {
        self.model.describe()
    }

    /// 从上传的字节分类。解码失败时不会调用模型。
    pub fn assess_bytes(&self, bytes: &[u8]) -> Result<Assessment> {
        let start_time = Instant::now();
        let image = ImageLoader::from_bytes(bytes)?;
        self.assess_decoded(&image, start_time)
    }

    /// 从文件路径分类
    pub fn assess_path(&self, path: &Path) -> Result<Assessment> {
        let start_time = Instant::now();
        let image = ImageLoader::from_path(path)?;
        self.assess_decoded(&image, start_time)
    }

    /// 对已解码的图像分类
    pub fn assess_image(&self, image: &DynamicImage) -> Result<Assessment> {
        self.assess_decoded(image, Instant::now())
    }

    fn assess_decoded(&self, image: &DynamicImage, start_time: Instant) -> Result<Assessment> {
        let input = self.preprocessor.preprocess(image)?;
        let output = self.model.forward(&input)?;
        let raw_score = self.output.extract(&output)?;
        let probability = Probability::clamped(raw_score)?;

        let elapsed = start_time.elapsed();
        tracing::debug!(
            "Assessment: raw_score={:.4}, probability={:.4}, time={:.3}s",
            raw_score,
            probability.value(),
            elapsed.as_secs_f32()
        );

        Ok(Assessment {
            probability,
            raw_score,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{RiskLabel, ThresholdPreset};
    use crate::image::PreprocessConfig;
    use ndarray::{ArrayD, IxDyn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 固定输出的替身模型
    struct FixedModel {
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(output: Vec<f32>) -> Arc<Self> {
            Arc::new(Self { output, calls: AtomicUsize::new(0) })
        }
    }

    impl RiskModel for FixedModel {
        fn forward(&self, input: &Array4<f32>) -> Result<ArrayD<f32>> {
            assert_eq!(input.shape(), &[1, 3, 224, 224]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ArrayD::from_shape_vec(IxDyn(&[1, self.output.len()]), self.output.clone()).unwrap())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn config(output: OutputConvention) -> ClassifierConfig {
        ClassifierConfig::new(PreprocessConfig::default(), output)
    }

    #[test]
    fn test_warm_up_runs_once_on_construction() {
        let model = FixedModel::new(vec![0.0]);
        RiskClassifier::new(model.clone(), &config(OutputConvention::SigmoidLogit)).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_warm_up_mismatch_is_model_load_error() {
        let model = FixedModel::new(vec![0.2, 0.8]);
        let err = RiskClassifier::new(model, &config(OutputConvention::SigmoidLogit)).err().unwrap();
        assert!(matches!(err, ClassifyError::ModelLoad(_)));
    }

    #[test]
    fn test_assess_image_clamps() {
        let model = FixedModel::new(vec![1.5]);
        let classifier = RiskClassifier::new(model, &config(OutputConvention::Probability)).unwrap();
        let assessment = classifier.assess_image(&DynamicImage::new_rgb8(300, 200)).unwrap();
        assert_eq!(assessment.raw_score, 1.5);
        assert_eq!(assessment.probability.value(), 1.0);
        assert_eq!(assessment.grade(ThresholdPreset::Binary).label, RiskLabel::Risky);
    }

    #[test]
    fn test_invalid_bytes_skip_model() {
        let model = FixedModel::new(vec![0.0]);
        let classifier =
            RiskClassifier::new(model.clone(), &config(OutputConvention::SigmoidLogit)).unwrap();
        let err = classifier.assess_bytes(b"GIF89a but not really").unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidImage(_)));
        // 只有预热调用
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }
}
