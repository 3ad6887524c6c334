use crate::utils::error::ClassifyError;
use crate::Result;
use image::{imageops, imageops::FilterType, RgbImage};

/// 缩放使用的插值方式（双线性）
const FILTER: FilterType = FilterType::Triangle;

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 直接缩放到目标尺寸（不保持宽高比）
    pub fn resize_exact(image: &RgbImage, width: u32, height: u32) -> RgbImage {
        if image.dimensions() == (width, height) {
            return image.clone();
        }
        imageops::resize(image, width, height, FILTER)
    }

    /// 按短边缩放到 `shorter_side`，保持宽高比
    pub fn resize_shorter_side(image: &RgbImage, shorter_side: u32) -> Result<RgbImage> {
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(ClassifyError::InvalidImage("Image has zero size".to_string()));
        }

        // 长边按比例截断，与常见训练框架的行为一致
        let (new_w, new_h) = if w <= h {
            let scaled = (u64::from(shorter_side) * u64::from(h) / u64::from(w)) as u32;
            (shorter_side, scaled)
        } else {
            let scaled = (u64::from(shorter_side) * u64::from(w) / u64::from(h)) as u32;
            (scaled, shorter_side)
        };

        Ok(Self::resize_exact(image, new_w, new_h))
    }

    /// 长宽比超过 `max_ratio` 时，沿长边中心裁剪到该比例
    pub fn limit_aspect_ratio(image: &RgbImage, max_ratio: u32) -> RgbImage {
        let (w, h) = image.dimensions();
        let max_w = u64::from(h) * u64::from(max_ratio);
        let max_h = u64::from(w) * u64::from(max_ratio);

        if u64::from(w) > max_w {
            let left = (w - max_w as u32) / 2;
            imageops::crop_imm(image, left, 0, max_w as u32, h).to_image()
        } else if u64::from(h) > max_h {
            let top = (h - max_h as u32) / 2;
            imageops::crop_imm(image, 0, top, w, max_h as u32).to_image()
        } else {
            image.clone()
        }
    }

    /// 中心裁剪
    pub fn center_crop(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
        let (w, h) = image.dimensions();
        if width > w || height > h {
            return Err(ClassifyError::InvalidImage(format!(
                "Cannot crop {}x{} out of {}x{}",
                width, height, w, h
            )));
        }

        let left = ((w - width) as f32 / 2.0).round() as u32;
        let top = ((h - height) as f32 / 2.0).round() as u32;

        Ok(imageops::crop_imm(image, left, top, width, height).to_image())
    }
}
