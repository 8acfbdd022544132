//! Image fact extraction: dimensions, format, alpha.

use crate::hash::perceptual_hash;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFacts {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f64,
    pub format: String,
    pub has_alpha: bool,
    pub perceptual_hash: u64,
}

/// Decodes an image file. Failures (corrupt file, unsupported format) do not
/// fail the whole scan — the caller simply omits the image sub-record.
pub fn probe(path: &std::path::Path) -> anyhow::Result<ImageFacts> {
    let img = image::open(path)?;
    Ok(from_image(&img))
}

pub fn from_image(img: &image::DynamicImage) -> ImageFacts {
    let width = img.width();
    let height = img.height();
    ImageFacts {
        width,
        height,
        aspect_ratio: width as f64 / height.max(1) as f64,
        format: format_name(img),
        has_alpha: img.color().has_alpha(),
        perceptual_hash: perceptual_hash(img),
    }
}

fn format_name(img: &image::DynamicImage) -> String {
    use image::ColorType::*;
    match img.color() {
        Rgba8 | Rgba16 | Rgba32F | La8 | La16 => "rgba".to_string(),
        _ => "rgb".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn computes_aspect_ratio_from_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1000, 1500));
        let facts = from_image(&img);
        assert_eq!(facts.width, 1000);
        assert_eq!(facts.height, 1500);
        assert!((facts.aspect_ratio - (1000.0 / 1500.0)).abs() < 1e-6);
    }
}
