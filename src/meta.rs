//! Per-page resolution metadata.
//!
//! The output format tags each page with X/Y resolution as a rational
//! number plus a resolution unit. Metadata is built fresh from each
//! page's own effective DPI — reusing a previous page's values would
//! tag pages with the wrong scale.

use crate::error::{Error, Result};

/// A resolution value expressed as numerator/denominator, per the
/// container's metadata tagging convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    /// Whole-number rational `value/1`.
    pub fn whole(value: u32) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }
}

/// Unit for resolution values.
///
/// Discriminants are the container's tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum ResolutionUnit {
    /// Dots per inch.
    #[default]
    Inch = 2,
    /// Dots per centimeter.
    Centimeter = 3,
}

/// Resolution metadata attached to one encoded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetadata {
    /// Horizontal resolution.
    pub x_resolution: Rational,
    /// Vertical resolution.
    pub y_resolution: Rational,
    /// Unit for both axes; always inch in this pipeline.
    pub unit: ResolutionUnit,
}

impl PageMetadata {
    /// Build metadata from a page's effective DPI.
    ///
    /// The DPI is rounded to the nearest integer and used for both
    /// axes with denominator 1, unit inch.
    ///
    /// # Returns
    /// * `Err(Error::Metadata)` if the DPI is non-finite, non-positive,
    ///   or rounds outside the representable range.
    pub fn from_dpi(effective_dpi: f64) -> Result<Self> {
        if !effective_dpi.is_finite() || effective_dpi <= 0.0 {
            return Err(Error::Metadata(format!(
                "effective DPI must be positive, got {effective_dpi}"
            )));
        }
        let rounded = effective_dpi.round();
        if rounded < 1.0 || rounded > u32::MAX as f64 {
            return Err(Error::Metadata(format!(
                "effective DPI {effective_dpi} out of range"
            )));
        }
        let dpi = rounded as u32;
        Ok(Self {
            x_resolution: Rational::whole(dpi),
            y_resolution: Rational::whole(dpi),
            unit: ResolutionUnit::Inch,
        })
    }
}
