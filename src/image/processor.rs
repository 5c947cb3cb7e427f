use super::ImageService;
use crate::models::{EncodedImage, MaxDimensions};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

pub const JPEG_QUALITY: u8 = 95;

pub struct ImageProcessor {
    max_dimensions: MaxDimensions,
}

impl ImageProcessor {
    pub fn new(max_dimensions: MaxDimensions) -> Self {
        Self { max_dimensions }
    }

    /// Shrinks `image` so both sides fit `max`, keeping the aspect ratio.
    /// Images already inside the box are returned untouched.
    pub fn fit_within(image: DynamicImage, max: MaxDimensions) -> DynamicImage {
        if max.fits(image.width(), image.height()) {
            return image;
        }

        let resized = image.resize(max.max_width, max.max_height, FilterType::Lanczos3);
        tracing::debug!(
            "Resized image {}x{} -> {}x{}",
            image.width(),
            image.height(),
            resized.width(),
            resized.height()
        );
        resized
    }

    pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
        // JPEG has no alpha channel and no 16-bit samples.
        let image = match image.color() {
            ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
            _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
        };

        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
        image.write_with_encoder(encoder)?;
        Ok(buf)
    }

    fn load(path: &Path) -> Result<DynamicImage> {
        let bytes = std::fs::read(path).map_err(|e| Error::ImageLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        image::load_from_memory(&bytes).map_err(|e| Error::ImageLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    fn prepare_sync(path: PathBuf, max: MaxDimensions) -> Result<EncodedImage> {
        let image = Self::load(&path)?;
        let image = Self::fit_within(image, max);
        let jpeg = Self::encode_jpeg(&image)?;

        let data = STANDARD.encode(&jpeg);
        tracing::debug!(
            "Encoded {} as {} bytes JPEG, {} bytes base64",
            path.display(),
            jpeg.len(),
            data.len()
        );

        Ok(EncodedImage {
            data,
            width: image.width(),
            height: image.height(),
        })
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(MaxDimensions::default())
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn prepare(&self, path: &Path) -> Result<EncodedImage> {
        tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            let max = self.max_dimensions;
            move || Self::prepare_sync(path, max)
        })
        .await
        .map_err(|e| Error::Invariant(format!("Image preparation task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_test_image(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(width, height, Rgb([200, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    fn decode(encoded: &EncodedImage) -> (Vec<u8>, DynamicImage) {
        let bytes = STANDARD.decode(&encoded.data).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        (bytes, image)
    }

    #[tokio::test]
    async fn test_small_image_keeps_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "small.png", 640, 480);

        let encoded = ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!((encoded.width, encoded.height), (640, 480));
        let (_, image) = decode(&encoded);
        assert_eq!((image.width(), image.height()), (640, 480));
    }

    #[tokio::test]
    async fn test_large_landscape_image_fits_box() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "wide.png", 3000, 1500);

        let encoded = ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!((encoded.width, encoded.height), (1120, 560));
    }

    #[tokio::test]
    async fn test_large_portrait_image_keeps_aspect_ratio() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "tall.png", 1300, 2600);

        let processor = ImageProcessor::new(MaxDimensions::new(1120, 1120));
        let encoded = processor.prepare(&path).await.unwrap();

        assert!(encoded.width <= 1120 && encoded.height <= 1120);
        let original = 1300.0 / 2600.0;
        let prepared = encoded.width as f64 / encoded.height as f64;
        assert!((original - prepared).abs() < 0.01, "ratio {prepared}");
    }

    #[tokio::test]
    async fn test_only_one_side_over_limit_is_still_resized() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "strip.png", 1200, 100);

        let encoded = ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!(encoded.width, 1120);
        assert!(encoded.height <= 100);
    }

    #[tokio::test]
    async fn test_output_is_jpeg_matching_prepared_size() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "photo.png", 2240, 1000);

        let encoded = ImageProcessor::default().prepare(&path).await.unwrap();
        let (bytes, image) = decode(&encoded);

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!((image.width(), image.height()), (encoded.width, encoded.height));
    }

    #[tokio::test]
    async fn test_source_file_is_not_modified() {
        let dir = TempDir::new().unwrap();
        let path = write_test_image(&dir, "keep.png", 2000, 2000);
        let before = std::fs::read(&path).unwrap();

        ImageProcessor::default().prepare(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_file_is_image_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.jpg");

        let err = ImageProcessor::default().prepare(&path).await.unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_image_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = ImageProcessor::default().prepare(&path).await.unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[test]
    fn test_encode_jpeg_flattens_alpha() {
        let image =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 128])));

        let bytes = ImageProcessor::encode_jpeg(&image).unwrap();

        assert_eq!(bytes[..3], [0xFF, 0xD8, 0xFF]);
    }
}
