use crate::utils::error::ClassifyError;
use crate::Result;
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// 单个TTA变体的变换描述
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Augmentation {
    /// 水平镜像
    #[serde(default)]
    pub flip: bool,

    /// 中心放大系数（>= 1.0，1.0 表示不裁剪）
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

fn default_zoom() -> f64 {
    1.0
}

impl Augmentation {
    pub const fn identity() -> Self {
        Self { flip: false, zoom: 1.0 }
    }

    pub const fn flip() -> Self {
        Self { flip: true, zoom: 1.0 }
    }

    pub const fn zoom(factor: f64) -> Self {
        Self { flip: false, zoom: factor }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.zoom.is_finite() || self.zoom < 1.0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Zoom factor must be >= 1.0, got {}",
                self.zoom
            )));
        }
        Ok(())
    }

    /// 日志与 /api/info 中使用的简短名称
    pub fn describe(&self) -> String {
        match (self.flip, self.zoom > 1.0) {
            (false, false) => "identity".to_string(),
            (true, false) => "flip".to_string(),
            (false, true) => format!("zoom({})", self.zoom),
            (true, true) => format!("flip+zoom({})", self.zoom),
        }
    }
}

impl Default for Augmentation {
    fn default() -> Self {
        Self::identity()
    }
}

/// 图像变换工具集
pub struct ImageTransforms;

impl ImageTransforms {
    /// 水平镜像，尺寸不变
    pub fn flip_horizontal(image: &RgbImage) -> RgbImage {
        imageops::flip_horizontal(image)
    }

    /// 中心裁剪出 (W/zoom, H/zoom) 区域，模拟放大
    pub fn center_zoom(image: &RgbImage, zoom: f64) -> Result<RgbImage> {
        if !zoom.is_finite() || zoom < 1.0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Zoom factor must be >= 1.0, got {}",
                zoom
            )));
        }

        let (width, height) = image.dimensions();
        if zoom == 1.0 {
            return Ok(image.clone());
        }

        let new_w = ((width as f64 / zoom) as u32).max(1);
        let new_h = ((height as f64 / zoom) as u32).max(1);
        let left = (width - new_w) / 2;
        let top = (height - new_h) / 2;

        Ok(imageops::crop_imm(image, left, top, new_w, new_h).to_image())
    }

    /// 拉伸到目标尺寸（不保持宽高比）
    pub fn resize_exact(image: &RgbImage, target_width: u32, target_height: u32) -> RgbImage {
        if image.dimensions() == (target_width, target_height) {
            return image.clone();
        }
        imageops::resize(image, target_width, target_height, FilterType::CatmullRom)
    }

    /// 按描述依次执行：翻转 -> 中心裁剪 -> 缩放
    pub fn apply(
        image: &RgbImage,
        augmentation: &Augmentation,
        target_width: u32,
        target_height: u32,
    ) -> Result<RgbImage> {
        augmentation.validate()?;

        let mut transformed = if augmentation.flip {
            Self::flip_horizontal(image)
        } else {
            image.clone()
        };

        if augmentation.zoom > 1.0 {
            transformed = Self::center_zoom(&transformed, augmentation.zoom)?;
        }

        Ok(Self::resize_exact(&transformed, target_width, target_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]))
    }

    #[test]
    fn flip_keeps_dimensions_and_mirrors() {
        let image = gradient(30, 20);
        let flipped = ImageTransforms::flip_horizontal(&image);

        assert_eq!(flipped.dimensions(), (30, 20));
        assert_eq!(flipped.get_pixel(0, 5), image.get_pixel(29, 5));
        assert_eq!(flipped.get_pixel(29, 19), image.get_pixel(0, 19));
    }

    #[test]
    fn zoom_crops_centered_region() {
        let image = gradient(120, 60);
        let cropped = ImageTransforms::center_zoom(&image, 1.2).unwrap();

        assert_eq!(cropped.dimensions(), (100, 50));
        // 左上角偏移为 ((120-100)/2, (60-50)/2) = (10, 5)
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([10, 5, 7]));
        assert_eq!(cropped.get_pixel(99, 49), &Rgb([109, 54, 7]));
    }

    #[test]
    fn zoom_of_one_is_a_no_op() {
        let image = gradient(17, 9);
        let same = ImageTransforms::center_zoom(&image, 1.0).unwrap();
        assert_eq!(same, image);
    }

    #[test]
    fn zoom_below_one_is_rejected() {
        let image = gradient(10, 10);
        assert!(ImageTransforms::center_zoom(&image, 0.5).is_err());
        assert!(Augmentation::zoom(f64::NAN).validate().is_err());
    }

    #[test]
    fn apply_always_yields_target_size() {
        let image = gradient(300, 150);
        for augmentation in [
            Augmentation::identity(),
            Augmentation::flip(),
            Augmentation::zoom(1.2),
        ] {
            let out = ImageTransforms::apply(&image, &augmentation, 224, 224).unwrap();
            assert_eq!(out.dimensions(), (224, 224));
        }
    }

    #[test]
    fn describe_names_the_recipe() {
        assert_eq!(Augmentation::identity().describe(), "identity");
        assert_eq!(Augmentation::flip().describe(), "flip");
        assert_eq!(Augmentation::zoom(1.2).describe(), "zoom(1.2)");
    }
}
