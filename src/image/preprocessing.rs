use crate::image::{Augmentation, ImageLoader, ImageTransforms};
use crate::utils::error::ClassifyError;
use crate::Result;
use image::RgbImage;
use ndarray::Array4;

/// 模型输入边长（224x224x3，NHWC）
pub const INPUT_SIZE: u32 = 224;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 原始字节 -> 单个变体的 (1, 224, 224, 3) 张量
    pub fn prepare(bytes: &[u8], augmentation: &Augmentation, max_size: usize) -> Result<Array4<f32>> {
        let rgb = ImageLoader::from_bytes(bytes, max_size)?.to_rgb8();
        Self::prepare_rgb(&rgb, augmentation)
    }

    /// 只解码一次，按顺序为每个描述生成独立张量
    pub fn prepare_variants(
        bytes: &[u8],
        augmentations: &[Augmentation],
        max_size: usize,
    ) -> Result<Vec<Array4<f32>>> {
        let rgb = ImageLoader::from_bytes(bytes, max_size)?.to_rgb8();

        augmentations
            .iter()
            .map(|augmentation| Self::prepare_rgb(&rgb, augmentation))
            .collect()
    }

    pub fn prepare_rgb(rgb: &RgbImage, augmentation: &Augmentation) -> Result<Array4<f32>> {
        let transformed = ImageTransforms::apply(rgb, augmentation, INPUT_SIZE, INPUT_SIZE)?;
        Self::to_tensor(&transformed)
    }

    /// RGB8 -> f32 NHWC 张量，保留 0..255 原始取值，缩放由模型内部完成
    pub fn to_tensor(rgb: &RgbImage) -> Result<Array4<f32>> {
        let (width, height) = rgb.dimensions();
        let data: Vec<f32> = rgb.as_raw().iter().map(|&v| f32::from(v)).collect();

        Array4::from_shape_vec((1, height as usize, width as usize, 3), data)
            .map_err(|e| ClassifyError::ImageProcessing(format!("Failed to build tensor: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn encoded(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        });
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn tensor_has_fixed_shape_and_raw_values() {
        let bytes = encoded(64, 48);
        let tensor = ImagePreprocessor::prepare(&bytes, &Augmentation::identity(), usize::MAX).unwrap();

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        // 左侧为红色，未做归一化
        assert_eq!(tensor[[0, 100, 0, 0]], 255.0);
        assert_eq!(tensor[[0, 100, 0, 2]], 0.0);
    }

    #[test]
    fn flip_variant_is_mirrored() {
        let bytes = encoded(64, 48);
        let tensor = ImagePreprocessor::prepare(&bytes, &Augmentation::flip(), usize::MAX).unwrap();

        // 镜像后左侧变成蓝色
        assert_eq!(tensor[[0, 100, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 100, 0, 2]], 255.0);
    }

    #[test]
    fn variants_follow_recipe_order() {
        let bytes = encoded(40, 40);
        let recipe = [Augmentation::identity(), Augmentation::flip(), Augmentation::zoom(1.2)];
        let tensors = ImagePreprocessor::prepare_variants(&bytes, &recipe, usize::MAX).unwrap();

        assert_eq!(tensors.len(), 3);
        assert!(tensors.iter().all(|t| t.shape() == [1, 224, 224, 3]));
        assert_ne!(tensors[0], tensors[1]);
    }

    #[test]
    fn undecodable_bytes_fail() {
        let result = ImagePreprocessor::prepare(b"\x00\x01\x02", &Augmentation::identity(), usize::MAX);
        assert!(matches!(result, Err(ClassifyError::ImageDecode(_))));
    }
}
