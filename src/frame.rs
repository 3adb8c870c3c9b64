// Output frame type and pixel-format conversion.
//
// Capture always produces BGRA8; consumers get 3-channel BGR or 1-channel
// grayscale. Conversion is deterministic: equal inputs yield equal frames.

use std::path::Path;

use anyhow::{bail, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

/// Channel layout of a returned frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 channels, blue-green-red byte order.
    Bgr8,
    /// 1 channel, BT.601 luma.
    Gray8,
}

impl PixelFormat {
    pub fn channels(&self) -> u32 {
        match self {
            PixelFormat::Bgr8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Single captured frame.
///
/// `data` is tightly packed, row-major, length = `width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Frame {
    /// Convert a tightly packed BGRA8 buffer into a new frame.
    pub fn from_bgra(bgra: &[u8], width: u32, height: u32, format: PixelFormat) -> Frame {
        debug_assert_eq!(bgra.len(), width as usize * height as usize * 4);

        let data = match format {
            PixelFormat::Bgr8 => {
                let mut out = Vec::with_capacity(bgra.len() / 4 * 3);
                for px in bgra.chunks_exact(4) {
                    out.extend_from_slice(&px[..3]);
                }
                out
            }
            PixelFormat::Gray8 => bgra.chunks_exact(4).map(|px| luma(px[2], px[1], px[0])).collect(),
        };

        Frame {
            data,
            width,
            height,
            format,
        }
    }

    /// Buffer shape as `(height, width, channels)`.
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.format.channels())
    }

    /// Save the frame to a file. The format is determined by the extension:
    /// `.png` `.bmp` `.jpg` `.jpeg` `.tiff` `.tif`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let img_fmt = match ext.as_str() {
            "png" => ImageFormat::Png,
            "bmp" => ImageFormat::Bmp,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "tiff" | "tif" => ImageFormat::Tiff,
            _ => bail!("unsupported extension '.{}'; supported: .png .bmp .jpg .tiff", ext),
        };

        let (pixels, color) = match self.format {
            PixelFormat::Bgr8 => {
                // BGR -> RGB
                let mut rgb = self.data.clone();
                for px in rgb.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                (rgb, ExtendedColorType::Rgb8)
            }
            PixelFormat::Gray8 => (self.data.clone(), ExtendedColorType::L8),
        };

        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);

        if img_fmt == ImageFormat::Png {
            let encoder =
                PngEncoder::new_with_quality(writer, CompressionType::Fast, FilterType::Sub);
            encoder.write_image(&pixels, self.width, self.height, color)?;
        } else {
            image::write_buffer_with_format(
                &mut writer,
                &pixels,
                self.width,
                self.height,
                color,
                img_fmt,
            )?;
        }

        Ok(())
    }
}

/// Integer BT.601 luma.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2x1 BGRA: pure red, pure blue.
    const BGRA: [u8; 8] = [0, 0, 255, 255, 255, 0, 0, 255];

    #[test]
    fn bgr_conversion_drops_alpha_and_keeps_order() {
        let frame = Frame::from_bgra(&BGRA, 2, 1, PixelFormat::Bgr8);
        assert_eq!(frame.data, vec![0, 0, 255, 255, 0, 0]);
        assert_eq!(frame.shape(), (1, 2, 3));
    }

    #[test]
    fn gray_conversion_uses_bt601_weights() {
        let frame = Frame::from_bgra(&BGRA, 2, 1, PixelFormat::Gray8);
        // red: (77*255 + 128) >> 8 = 77; blue: (29*255 + 128) >> 8 = 29
        assert_eq!(frame.data, vec![77, 29]);
        assert_eq!(frame.shape(), (1, 2, 1));
    }

    #[test]
    fn gray_extremes() {
        let white = [255u8, 255, 255, 255];
        let black = [0u8, 0, 0, 255];
        assert_eq!(Frame::from_bgra(&white, 1, 1, PixelFormat::Gray8).data, vec![255]);
        assert_eq!(Frame::from_bgra(&black, 1, 1, PixelFormat::Gray8).data, vec![0]);
    }

    #[test]
    fn identical_inputs_yield_identical_frames() {
        let a = Frame::from_bgra(&BGRA, 2, 1, PixelFormat::Bgr8);
        let b = Frame::from_bgra(&BGRA, 2, 1, PixelFormat::Bgr8);
        assert_eq!(a, b);
    }

    #[test]
    fn shape_matches_requested_mode() {
        let bgra = vec![0u8; 640 * 480 * 4];
        let color = Frame::from_bgra(&bgra, 640, 480, PixelFormat::Bgr8);
        let gray = Frame::from_bgra(&bgra, 640, 480, PixelFormat::Gray8);
        assert_eq!(color.shape(), (480, 640, 3));
        assert_eq!(color.data.len(), 640 * 480 * 3);
        assert_eq!(gray.shape(), (480, 640, 1));
        assert_eq!(gray.data.len(), 640 * 480);
    }
}
