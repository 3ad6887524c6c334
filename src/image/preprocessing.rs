use crate::image::transforms::ImageTransforms;
use crate::Result;
use image::{DynamicImage, RgbImage};
use ndarray::Array4;
use serde::Serialize;

/// 模型输入边长
pub const INPUT_SIZE: u32 = 224;

/// 先缩放再裁剪策略中的短边长度
pub const RESIZE_SHORTER_SIDE: u32 = 256;

/// 先缩放再裁剪策略中允许的最大长宽比
pub const MAX_ASPECT_RATIO: u32 = 2;

pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 缩放策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizePolicy {
    /// 直接缩放到 224x224
    Direct,
    /// 短边缩放到 256，再中心裁剪 224x224
    ResizeThenCrop,
}

/// 像素归一化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// (x/255 - mean) / std
    Imagenet,
    /// x/255
    UnitScale,
}

/// 张量维度排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TensorLayout {
    /// (1, 3, H, W)
    Nchw,
    /// (1, H, W, 3)
    Nhwc,
}

impl ResizePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizePolicy::Direct => "direct",
            ResizePolicy::ResizeThenCrop => "resize-then-crop",
        }
    }
}

impl Normalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Normalization::Imagenet => "imagenet",
            Normalization::UnitScale => "unit-scale",
        }
    }

    /// 对单个通道值归一化
    #[inline]
    pub fn apply(&self, value: u8, channel: usize) -> f32 {
        let scaled = f32::from(value) / 255.0;
        match self {
            Normalization::Imagenet => (scaled - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
            Normalization::UnitScale => scaled,
        }
    }
}

impl TensorLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            TensorLayout::Nchw => "nchw",
            TensorLayout::Nhwc => "nhwc",
        }
    }

    /// 该排列下的输入形状
    pub fn shape(&self, size: usize) -> (usize, usize, usize, usize) {
        match self {
            TensorLayout::Nchw => (1, 3, size, size),
            TensorLayout::Nhwc => (1, size, size, 3),
        }
    }
}

/// 预处理配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreprocessConfig {
    pub resize: ResizePolicy,
    pub normalization: Normalization,
    pub layout: TensorLayout,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            resize: ResizePolicy::Direct,
            normalization: Normalization::Imagenet,
            layout: TensorLayout::Nchw,
        }
    }
}

/// 将任意图像转换为模型输入张量
#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// 模型期望的输入形状
    pub fn input_shape(&self) -> (usize, usize, usize, usize) {
        self.config.layout.shape(INPUT_SIZE as usize)
    }

    /// 完整预处理：RGB -> 缩放/裁剪 -> 归一化 -> 添加batch维度
    pub fn preprocess(&self, image: &DynamicImage) -> Result<Array4<f32>> {
        let rgb = image.to_rgb8();
        let resized = self.resize(&rgb)?;
        Ok(self.to_tensor(&resized))
    }

    fn resize(&self, rgb: &RgbImage) -> Result<RgbImage> {
        match self.config.resize {
            ResizePolicy::Direct => Ok(ImageTransforms::resize_exact(rgb, INPUT_SIZE, INPUT_SIZE)),
            ResizePolicy::ResizeThenCrop => {
                // 最终只取中心正方形，先裁掉多余的长边，避免超长中间图像
                let limited = ImageTransforms::limit_aspect_ratio(rgb, MAX_ASPECT_RATIO);
                let resized = ImageTransforms::resize_shorter_side(&limited, RESIZE_SHORTER_SIDE)?;
                ImageTransforms::center_crop(&resized, INPUT_SIZE, INPUT_SIZE)
            }
        }
    }

    fn to_tensor(&self, rgb: &RgbImage) -> Array4<f32> {
        let normalization = self.config.normalization;
        let mut tensor = Array4::<f32>::zeros(self.input_shape());

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                let value = normalization.apply(pixel[c], c);
                match self.config.layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                }
            }
        }

        tensor
    }
}
