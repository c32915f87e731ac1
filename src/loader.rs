use std::path::Path;

use anyhow::Context;
use image::{ImageReader, RgbImage, imageops::FilterType};
use log::info;

use crate::k_means::Point;

/// Opens `path` as 8-bit RGB, shrunk so neither side exceeds `resize`
/// (`0` keeps the original size).
pub fn load_image(path: &Path, resize: u32) -> anyhow::Result<RgbImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("Reading image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("Reading image {}", path.display()))?
        .decode()
        .context("Decoding image")?
        .into_rgb8();

    Ok(downsample(image, resize))
}

/// Size the image should be scaled to, or `None` if it already fits.
pub fn target_dimensions(width: u32, height: u32, resize: u32) -> Option<(u32, u32)> {
    if resize == 0 {
        return None;
    }

    let scale = resize as f64 / width.max(height) as f64;
    if scale >= 1. {
        return None;
    }

    let w = ((width as f64 * scale) as u32).max(1);
    let h = ((height as f64 * scale) as u32).max(1);
    Some((w, h))
}

/// Bicubic, matching what most imaging libraries resize with by default.
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

pub fn downsample(image: RgbImage, resize: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    match target_dimensions(width, height, resize) {
        Some((w, h)) => {
            info!("Resizing {}x{} -> {}x{}", width, height, w, h);
            image::imageops::resize(&image, w, h, RESAMPLE_FILTER)
        }
        None => image,
    }
}

/// Every pixel, row by row, with channels scaled into `[0, 1]`.
pub fn normalized_pixels(image: &RgbImage) -> Vec<Point> {
    image
        .pixels()
        .map(|px| px.0.map(|c| c as f64 / 255.))
        .collect()
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn large_images_shrink_to_the_limit() {
        assert_eq!(target_dimensions(800, 400, 400), Some((400, 200)));
        assert_eq!(target_dimensions(200, 800, 400), Some((100, 400)));
    }

    #[test]
    fn small_images_are_left_alone() {
        assert_eq!(target_dimensions(400, 400, 400), None);
        assert_eq!(target_dimensions(120, 80, 400), None);
        assert_eq!(target_dimensions(5000, 80, 0), None);
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(target_dimensions(4000, 2, 400), Some((400, 1)));
    }

    #[test]
    fn downsample_sets_max_side() {
        let image = RgbImage::from_pixel(1000, 500, Rgb([10, 20, 30]));
        let small = downsample(image, 400);
        assert_eq!(small.dimensions(), (400, 200));
        assert_eq!(small.get_pixel(17, 17), &Rgb([10, 20, 30]));
    }

    #[test]
    fn downsample_is_bicubic() {
        let image = RgbImage::from_fn(1000, 500, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 251) as u8])
        });
        let expected = image::imageops::resize(&image, 400, 200, FilterType::CatmullRom);
        let bilinear = image::imageops::resize(&image, 400, 200, FilterType::Triangle);

        let small = downsample(image, 400);
        assert_eq!(small, expected);
        assert_ne!(small, bilinear);
    }

    #[test]
    fn pixels_are_normalized() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 51]));
        let pixels = normalized_pixels(&image);
        assert_eq!(pixels, vec![[1., 0., 0.2], [0., 0., 0.]]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_image(Path::new("does/not/exist.png"), 400).is_err());
    }
}
