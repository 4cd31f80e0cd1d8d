//! Target color modes and pixel conversion
//!
//! Mode names follow the usual imaging conventions (`1`, `L`, `LA`, `RGB`,
//! `RGBA`, `CMYK`). Conversion produces the raw samples a PDF image XObject
//! expects for the matching device color space.

use std::fmt;
use std::str::FromStr;

use image::imageops::{dither, BiLevel};
use image::DynamicImage;

use crate::error::PdfOpsError;

/// Color mode every page image is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// 1 bit per pixel, Floyd-Steinberg dithered
    Bilevel,
    Gray,
    GrayAlpha,
    #[default]
    Rgb,
    Rgba,
    Cmyk,
}

impl ColorMode {
    pub const ALL: [ColorMode; 6] = [
        ColorMode::Bilevel,
        ColorMode::Gray,
        ColorMode::GrayAlpha,
        ColorMode::Rgb,
        ColorMode::Rgba,
        ColorMode::Cmyk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Bilevel => "1",
            ColorMode::Gray => "L",
            ColorMode::GrayAlpha => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Cmyk => "CMYK",
        }
    }

    /// Parse an optional form value; absent or blank means the default mode.
    pub fn from_optional(value: Option<&str>) -> Result<Self, PdfOpsError> {
        match value.map(str::trim) {
            None | Some("") => Ok(ColorMode::default()),
            Some(value) => value.parse(),
        }
    }

    /// PDF device color space for the color samples
    pub fn color_space(&self) -> &'static [u8] {
        match self {
            ColorMode::Bilevel | ColorMode::Gray | ColorMode::GrayAlpha => b"DeviceGray",
            ColorMode::Rgb | ColorMode::Rgba => b"DeviceRGB",
            ColorMode::Cmyk => b"DeviceCMYK",
        }
    }

    pub fn bits_per_component(&self) -> u8 {
        match self {
            ColorMode::Bilevel => 1,
            _ => 8,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::GrayAlpha | ColorMode::Rgba)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = PdfOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1" => Ok(ColorMode::Bilevel),
            "L" => Ok(ColorMode::Gray),
            "LA" => Ok(ColorMode::GrayAlpha),
            "RGB" => Ok(ColorMode::Rgb),
            "RGBA" => Ok(ColorMode::Rgba),
            "CMYK" => Ok(ColorMode::Cmyk),
            _ => Err(PdfOpsError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Image samples ready to be placed in a PDF image XObject
#[derive(Debug, Clone)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    /// Color samples, rows top to bottom; 1-bit rows are padded to a byte
    pub samples: Vec<u8>,
    /// 8-bit alpha plane, present for `LA` and `RGBA`
    pub alpha: Option<Vec<u8>>,
}

/// Convert a decoded image to `mode`.
pub fn convert(image: &DynamicImage, mode: ColorMode) -> Raster {
    let (width, height) = (image.width(), image.height());

    let (samples, alpha) = match mode {
        ColorMode::Bilevel => {
            let mut gray = image.to_luma8();
            dither(&mut gray, &BiLevel);
            (pack_bits(gray.as_raw(), width, height), None)
        }
        ColorMode::Gray => (image.to_luma8().into_raw(), None),
        ColorMode::GrayAlpha => {
            let (gray, alpha) = split_alpha(&image.to_luma_alpha8().into_raw(), 2);
            (gray, Some(alpha))
        }
        ColorMode::Rgb => (image.to_rgb8().into_raw(), None),
        ColorMode::Rgba => {
            let (rgb, alpha) = split_alpha(&image.to_rgba8().into_raw(), 4);
            (rgb, Some(alpha))
        }
        ColorMode::Cmyk => (rgb_to_cmyk(image.to_rgb8().as_raw()), None),
    };

    Raster {
        width,
        height,
        mode,
        samples,
        alpha,
    }
}

/// Split interleaved samples whose last channel is alpha.
fn split_alpha(raw: &[u8], channels: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels = raw.len() / channels;
    let mut color = Vec::with_capacity(pixels * (channels - 1));
    let mut alpha = Vec::with_capacity(pixels);

    for pixel in raw.chunks_exact(channels) {
        color.extend_from_slice(&pixel[..channels - 1]);
        alpha.push(pixel[channels - 1]);
    }

    (color, alpha)
}

/// Naive inversion with no black generation: C = 255 - R, K = 0.
fn rgb_to_cmyk(rgb: &[u8]) -> Vec<u8> {
    let mut cmyk = Vec::with_capacity(rgb.len() / 3 * 4);
    for pixel in rgb.chunks_exact(3) {
        cmyk.extend_from_slice(&[255 - pixel[0], 255 - pixel[1], 255 - pixel[2], 0]);
    }
    cmyk
}

/// Pack 8-bit gray into MSB-first 1-bit rows (1 = white).
fn pack_bits(gray: &[u8], width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let row_bytes = width.div_ceil(8);
    let mut packed = vec![0u8; row_bytes * height as usize];

    for (y, row) in gray.chunks_exact(width.max(1)).enumerate() {
        for (x, &value) in row.iter().enumerate() {
            if value > 127 {
                packed[y * row_bytes + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }

    packed
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_known_modes() {
        for mode in ColorMode::ALL {
            assert_eq!(mode.as_str().parse::<ColorMode>().unwrap(), mode);
        }
        assert_eq!("rgb".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!(" cmyk ".parse::<ColorMode>().unwrap(), ColorMode::Cmyk);
    }

    #[test]
    fn test_parse_unknown_mode() {
        let err = "P".parse::<ColorMode>().unwrap_err();
        assert!(matches!(err, PdfOpsError::UnsupportedMode(ref m) if m == "P"));
    }

    #[test]
    fn test_optional_defaults_to_rgb() {
        assert_eq!(ColorMode::from_optional(None).unwrap(), ColorMode::Rgb);
        assert_eq!(ColorMode::from_optional(Some("  ")).unwrap(), ColorMode::Rgb);
        assert_eq!(ColorMode::from_optional(Some("L")).unwrap(), ColorMode::Gray);
    }

    #[test]
    fn test_rgb_to_rgb_is_identity() {
        let img = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 40, y as u8 * 90, 7]));
        let raw = img.as_raw().clone();

        let raster = convert(&DynamicImage::ImageRgb8(img), ColorMode::Rgb);

        assert_eq!(raster.samples, raw);
        assert!(raster.alpha.is_none());
        assert_eq!((raster.width, raster.height), (3, 2));
    }

    #[test]
    fn test_rgba_splits_alpha_plane() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40]));

        let raster = convert(&DynamicImage::ImageRgba8(img), ColorMode::Rgba);

        assert_eq!(raster.samples, [10u8, 20, 30].repeat(4));
        assert_eq!(raster.alpha, Some(vec![40; 4]));
    }

    #[test]
    fn test_rgb_drops_alpha() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 0]));

        let raster = convert(&DynamicImage::ImageRgba8(img), ColorMode::Rgb);

        assert_eq!(raster.samples, vec![1, 2, 3, 1, 2, 3]);
        assert!(raster.alpha.is_none());
    }

    #[test]
    fn test_cmyk_inverts_channels() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 0, 100]));

        let raster = convert(&DynamicImage::ImageRgb8(img), ColorMode::Cmyk);

        assert_eq!(raster.samples, vec![0, 255, 155, 0]);
        assert_eq!(raster.mode.color_space(), b"DeviceCMYK");
    }

    #[test]
    fn test_bilevel_rows_are_byte_padded() {
        let img = RgbImage::from_fn(10, 2, |x, _| {
            if x < 5 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });

        let raster = convert(&DynamicImage::ImageRgb8(img), ColorMode::Bilevel);

        // 10 pixels per row -> 2 bytes per row
        assert_eq!(raster.samples.len(), 4);
        assert_eq!(raster.samples[0], 0b1111_1000);
        assert_eq!(raster.samples[1], 0);
        assert_eq!(raster.mode.bits_per_component(), 1);
    }
}
