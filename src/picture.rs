//! Image to number conversion
//!
//! A picture is smoothed, reduced to grayscale, stretched to full contrast,
//! shrunk to at most `max_digits` pixels and quantized into five brightness
//! levels. Each level maps to a digit whose glyph has roughly matching ink
//! density, and the digits read row by row form one large integer.

use crate::error::ImageError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use num_bigint::BigUint;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Height squash applied before resizing; text lines are taller than a glyph is wide.
pub const GLYPH_ASPECT_RATIO: f64 = 0.45;

/// Digits ordered from the brightest to the darkest glyph.
pub const BRIGHTNESS_ORDERED_DIGITS: [u8; 5] = [1, 7, 3, 9, 8];

/// Smallest accepted digit budget.
pub const MIN_DIGITS: usize = 10;

/// An integer together with the line width it should be rendered at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNumber {
    pub value: BigUint,
    pub width: usize,
}

impl ImageNumber {
    pub fn new(value: BigUint, width: usize) -> Self {
        Self { value, width }
    }

    /// Number of decimal digits in `value`.
    pub fn digit_count(&self) -> usize {
        self.value.to_str_radix(10).len()
    }
}

impl fmt::Display for ImageNumber {
    /// Writes the decimal digits with a line break every `width` digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.value.to_str_radix(10);
        if self.width == 0 {
            return f.write_str(&digits);
        }
        for (i, line) in digits.as_bytes().chunks(self.width).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            // chunks of an ASCII digit string are valid UTF-8
            f.write_str(std::str::from_utf8(line).map_err(|_| fmt::Error)?)?;
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<DynamicImage, ImageError> {
    Ok(image::open(path)?)
}

/// Target size for an image so that it holds at most `max_pixels` pixels
/// after the glyph aspect squash.
pub fn pixel_limit_dimensions(width: u32, height: u32, max_pixels: usize) -> (u32, u32) {
    let x = width as f64;
    let y = height as f64 * GLYPH_ASPECT_RATIO;
    let max_pixels = max_pixels.max(1);
    let scale = (x * y / max_pixels as f64).sqrt();
    let mut new_width = ((x / scale) as u32).max(1);
    let mut new_height = ((y / scale) as u32).max(1);
    // a side clamped up to one pixel must not push the total over the limit
    new_width = new_width.min(side_limit(max_pixels, new_height));
    new_height = new_height.min(side_limit(max_pixels, new_width));
    (new_width, new_height)
}

fn side_limit(max_pixels: usize, other_side: u32) -> u32 {
    let limit = (max_pixels / other_side as usize).max(1);
    u32::try_from(limit).unwrap_or(u32::MAX)
}

pub fn resize_for_pixel_limit(image: &GrayImage, max_pixels: usize) -> GrayImage {
    let (width, height) = pixel_limit_dimensions(image.width(), image.height(), max_pixels);
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// 3x3 minimum filter, edges clamped. Widens dark strokes before downscaling.
pub fn min_filter(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut darkest = u8::MAX;
        for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                darkest = darkest.min(image.get_pixel(nx, ny)[0]);
            }
        }
        Luma([darkest])
    })
}

/// Stretch brightness so the darkest pixel becomes 0 and the brightest 255.
pub fn autocontrast(image: &GrayImage) -> GrayImage {
    let (lo, hi) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi <= lo {
        return image.clone();
    }
    let range = (hi - lo) as u32;
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = ((p[0] - lo) as u32 * 255 / range) as u8;
    }
    out
}

/// Quantize into `levels` equal brightness bands; 0 is the brightest band.
pub fn quantize(image: &GrayImage, levels: usize) -> Vec<usize> {
    image
        .pixels()
        .map(|p| (u8::MAX - p[0]) as usize * levels / 256)
        .collect()
}

/// Read a quantized image row by row as a decimal number.
pub fn levels_to_number(levels: &[usize], width: usize) -> Result<ImageNumber, ImageError> {
    let digits: Vec<u8> = levels
        .iter()
        .map(|&level| {
            let index = level.min(BRIGHTNESS_ORDERED_DIGITS.len() - 1);
            b'0' + BRIGHTNESS_ORDERED_DIGITS[index]
        })
        .collect();
    let value = BigUint::parse_bytes(&digits, 10).ok_or(ImageError::Empty)?;
    Ok(ImageNumber::new(value, width))
}

/// Convert an image into a number of at most `max_digits` digits.
pub fn numberize(image: &DynamicImage, max_digits: usize) -> Result<ImageNumber, ImageError> {
    if max_digits < MIN_DIGITS {
        return Err(ImageError::TooFewDigits {
            requested: max_digits,
            min: MIN_DIGITS,
        });
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::Empty);
    }

    let gray = autocontrast(&min_filter(&image.to_luma8()));
    let resized = resize_for_pixel_limit(&gray, max_digits);
    info!(
        width = resized.width(),
        height = resized.height(),
        "resized image for conversion"
    );

    let levels = quantize(&resized, BRIGHTNESS_ORDERED_DIGITS.len());
    let number = levels_to_number(&levels, resized.width() as usize)?;
    info!(digits = number.digit_count(), "converted image into a number");
    Ok(number)
}
