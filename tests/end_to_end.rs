//! 端到端分类测试：用替身模型代替 ONNX 会话

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::{Array4, ArrayD, IxDyn};
use scalp_monitor::{
    image::{Normalization, PreprocessConfig, ResizePolicy, TensorLayout},
    models::{ModelManager, OutputConvention, RiskModel},
    ClassifierConfig, ClassifyError, RiskClassifier, RiskLabel, ThresholdPreset,
};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 记录调用次数并返回固定 logit 的模型
struct StubModel {
    logit: f32,
    calls: AtomicUsize,
}

impl StubModel {
    fn new(logit: f32) -> Arc<Self> {
        Arc::new(Self { logit, calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RiskModel for StubModel {
    fn forward(&self, input: &Array4<f32>) -> scalp_monitor::Result<ArrayD<f32>> {
        if input.shape() != [1, 3, 224, 224] {
            return Err(ClassifyError::Inference(format!("unexpected shape {:?}", input.shape())));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ArrayD::from_elem(IxDyn(&[1, 1]), self.logit))
    }

    fn describe(&self) -> String {
        format!("stub(logit={})", self.logit)
    }
}

fn jpeg_500() -> Vec<u8> {
    let image = RgbImage::from_fn(500, 500, |x, y| {
        Rgb([(x / 2) as u8, (y / 2) as u8, ((x + y) / 4) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

fn web_form_config() -> ClassifierConfig {
    ClassifierConfig::new(
        PreprocessConfig {
            resize: ResizePolicy::Direct,
            normalization: Normalization::Imagenet,
            layout: TensorLayout::Nchw,
        },
        OutputConvention::SigmoidLogit,
    )
}

#[test]
fn test_jpeg_through_stub_logit() {
    let model = StubModel::new(2.0);
    let classifier = RiskClassifier::new(model.clone(), &web_form_config()).unwrap();

    let assessment = classifier.assess_bytes(&jpeg_500()).unwrap();
    let p = assessment.probability.value();

    assert!((p - 0.8808).abs() < 1e-4, "p={}", p);
    assert_eq!(assessment.grade(ThresholdPreset::FourLevel).label, RiskLabel::VeryRisky);
    assert_eq!(assessment.grade(ThresholdPreset::Binary).label, RiskLabel::Risky);
    assert_eq!(assessment.grade(ThresholdPreset::SafeRisky).label, RiskLabel::Risky);

    // 预热 + 一次推理
    assert_eq!(model.calls(), 2);
}

#[test]
fn test_any_resolution_classifies() {
    for resize in [ResizePolicy::Direct, ResizePolicy::ResizeThenCrop] {
        let config = ClassifierConfig::new(
            PreprocessConfig { resize, ..PreprocessConfig::default() },
            OutputConvention::SigmoidLogit,
        );
        let classifier = RiskClassifier::new(StubModel::new(2.0), &config).unwrap();

        for (width, height) in [(12, 12), (9000, 20)] {
            let mut buffer = Cursor::new(Vec::new());
            DynamicImage::new_rgb8(width, height)
                .write_to(&mut buffer, ImageFormat::Png)
                .unwrap();

            let assessment = classifier.assess_bytes(buffer.get_ref()).unwrap();
            assert!((assessment.probability.value() - 0.8808).abs() < 1e-4);
        }
    }
}

#[test]
fn test_corrupt_upload_never_reaches_model() {
    let model = StubModel::new(2.0);
    let classifier = RiskClassifier::new(model.clone(), &web_form_config()).unwrap();
    let calls_after_warm_up = model.calls();

    let mut corrupt = jpeg_500();
    corrupt.truncate(200);

    for bytes in [b"%PDF-1.4 not an image".to_vec(), corrupt] {
        let err = classifier.assess_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ClassifyError::InvalidImage(_)), "got {}", err);
    }

    assert_eq!(model.calls(), calls_after_warm_up);
}

#[test]
fn test_same_bytes_same_result() {
    let model = StubModel::new(-0.5);
    let classifier = RiskClassifier::new(model, &web_form_config()).unwrap();
    let bytes = jpeg_500();

    let first = classifier.assess_bytes(&bytes).unwrap();
    let second = classifier.assess_bytes(&bytes).unwrap();
    assert_eq!(
        first.probability.value().to_bits(),
        second.probability.value().to_bits()
    );
}

#[test]
fn test_layout_mismatch_fails_at_load() {
    // 模型只接受 NCHW，配置为 NHWC 时预热失败
    let config = ClassifierConfig::new(
        PreprocessConfig {
            layout: TensorLayout::Nhwc,
            ..PreprocessConfig::default()
        },
        OutputConvention::SigmoidLogit,
    );

    let err = ModelManager::with_model(StubModel::new(0.0), &config, 1, 3).err().unwrap();
    assert!(matches!(err, ClassifyError::ModelLoad(_)), "got {}", err);
}

#[test]
fn test_manager_shares_one_classifier() {
    let manager = ModelManager::with_model(StubModel::new(0.0), &web_form_config(), 2, 3).unwrap();
    let a = manager.classifier();
    let b = manager.clone().classifier();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(manager.stats().intra_threads, 2);
    assert!(manager.stats().model.starts_with("stub"));
}
