//! Bitonal page rasters.
//!
//! A [`BitonalPage`] is a packed 1-bit-per-pixel buffer using the
//! two-entry palette {black = 0, white = 1}. Every pixel is exactly
//! black or exactly white — there are no intermediate tones, which is
//! what the Group 4 encoder and the output format require.

use fax::Color;

use crate::error::{Error, Result};

/// Threshold used when reducing 8-bit luma to bitonal: values at or
/// above this are white.
pub const LUMA_WHITE_THRESHOLD: u8 = 128;

/// A 1-bit black/white raster for a single page.
///
/// Rows are packed MSB-first, eight pixels per byte, with each row
/// padded to a whole byte. A set bit is white, a clear bit is black;
/// a freshly created page is all white (blank paper).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitonalPage {
    width: u32,
    height: u32,
    row_stride: usize,
    bits: Vec<u8>,
}

impl BitonalPage {
    /// Create an all-white page of the given dimensions.
    ///
    /// # Returns
    /// * `Err(Error::DegeneratePage)` if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::DegeneratePage {
                width: width as f64,
                height: height as f64,
            });
        }
        let row_stride = (width as usize).div_ceil(8);
        Ok(Self {
            width,
            height,
            row_stride,
            bits: vec![0xFF; row_stride * height as usize],
        })
    }

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at (x, y) is white.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    pub fn is_white(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let byte = self.bits[y as usize * self.row_stride + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// Set the pixel at (x, y) to white or black.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, white: bool) {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let index = y as usize * self.row_stride + x as usize / 8;
        let mask = 0x80 >> (x % 8);
        if white {
            self.bits[index] |= mask;
        } else {
            self.bits[index] &= !mask;
        }
    }

    /// Number of black pixels in the raster.
    pub fn black_pixel_count(&self) -> u64 {
        let mut count = 0u64;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.is_white(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Iterate one row as fax colors, left to right.
    pub(crate) fn row_colors(&self, y: u32) -> impl Iterator<Item = Color> + '_ {
        let width = self.width;
        (0..width).map(move |x| {
            if self.is_white(x, y) {
                Color::White
            } else {
                Color::Black
            }
        })
    }
}

/// Reduce an 8-bit grayscale image to a bitonal page.
///
/// Luma values at or above [`LUMA_WHITE_THRESHOLD`] become white,
/// everything below becomes black. This is a hard threshold with no
/// dithering, so the result is strictly two-tone.
#[cfg(feature = "pdfium")]
pub fn from_luma8(image: &image::GrayImage) -> Result<BitonalPage> {
    let mut page = BitonalPage::new(image.width(), image.height())?;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] < LUMA_WHITE_THRESHOLD {
            page.set_pixel(x, y, false);
        }
    }
    Ok(page)
}
