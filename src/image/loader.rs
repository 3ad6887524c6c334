use crate::utils::error::ClassifyError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

/// 上传文件大小上限（50MB）
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        // 检查文件大小
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClassifyError::InvalidImage(format!(
                "File too large: {} bytes, max allowed: {} bytes",
                bytes.len(),
                MAX_IMAGE_BYTES
            )));
        }
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidImage("Empty image data".to_string()));
        }

        let format = Self::detect_format(bytes).ok_or_else(|| {
            ClassifyError::InvalidImage("Unrecognized image data".to_string())
        })?;
        if !Self::is_supported_format(format) {
            return Err(ClassifyError::InvalidImage(format!("Unsupported format: {:?}", format)));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        Self::validate_dimensions(&image)?;

        Ok(image)
    }

    /// 从文件路径加载图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let bytes = std::fs::read(path).map_err(|e| {
            ClassifyError::InvalidImage(format!("Cannot read {}: {}", path.display(), e))
        })?;

        Self::from_bytes(&bytes)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format,
            ImageFormat::Png |
            ImageFormat::Jpeg |
            ImageFormat::Bmp |
            ImageFormat::Gif |
            ImageFormat::Tiff |
            ImageFormat::WebP
        )
    }

    /// 验证图像尺寸：任意分辨率均可，只拒绝空图像
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidImage(
                format!("Image has zero size: {}x{}", width, height)
            ));
        }

        Ok(())
    }
}
