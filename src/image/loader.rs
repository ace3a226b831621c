use crate::utils::error::ClassifyError;
use crate::Result;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

pub struct ImageLoader;

impl ImageLoader {
    /// 从内存字节加载图像，格式由内容推断
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty image data".to_string()));
        }

        // 检查文件大小
        if bytes.len() > max_size {
            return Err(ClassifyError::FileTooLarge(bytes.len(), max_size));
        }

        if let Some(format) = Self::detect_format(bytes) {
            if !Self::is_supported_format(format) {
                return Err(ClassifyError::UnsupportedFormat(format!("{:?}", format)));
            }
        }

        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .decode()?;

        Self::validate_dimensions(&image)?;
        Ok(image)
    }

    /// 从文件路径加载并完整解码图像
    pub fn from_path(path: &Path) -> Result<DynamicImage> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Gif
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 100, 50]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_png_from_memory() {
        let bytes = png_bytes(8, 4);
        assert_eq!(ImageLoader::detect_format(&bytes), Some(ImageFormat::Png));

        let image = ImageLoader::from_bytes(&bytes, 1024 * 1024).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = ImageLoader::from_bytes(b"definitely not an image", 1024).unwrap_err();
        assert!(matches!(err, ClassifyError::ImageDecode(_)));
    }

    #[test]
    fn rejects_empty_and_oversized_buffers() {
        assert!(matches!(
            ImageLoader::from_bytes(&[], 1024),
            Err(ClassifyError::InvalidInput(_))
        ));

        let bytes = png_bytes(8, 8);
        assert!(matches!(
            ImageLoader::from_bytes(&bytes, 4),
            Err(ClassifyError::FileTooLarge(_, 4))
        ));
    }

    #[test]
    fn common_formats_are_supported() {
        assert!(ImageLoader::is_supported_format(ImageFormat::Jpeg));
        assert!(ImageLoader::is_supported_format(ImageFormat::Png));
        assert!(!ImageLoader::is_supported_format(ImageFormat::Farbfeld));
    }
}
