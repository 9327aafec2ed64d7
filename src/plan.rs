//! Per-page resolution planning.
//!
//! Computes the scale factor needed for a page's raster to meet a
//! target print resolution, using a diagonal-length heuristic against
//! US Letter paper. Pages are only ever scaled *up* to reach the
//! target; a page that already meets it keeps scale 1.0.

use crate::error::{Error, Result};

/// Reference paper size for the baseline-DPI heuristic: US Letter,
/// 8.5 x 11 at 1 unit = 1 inch.
const REFERENCE_WIDTH_IN: f64 = 8.5;
const REFERENCE_HEIGHT_IN: f64 = 11.0;

/// Tolerance below the target DPI before upscaling kicks in, so
/// floating rounding cannot oscillate the decision.
const DPI_EPSILON: f64 = 0.1;

/// Geometry computed for a single page.
///
/// Transient: recomputed per page, never persisted or reused for a
/// different page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Natural width at unit scale, in abstract units.
    pub natural_width: f64,
    /// Natural height at unit scale, in abstract units.
    pub natural_height: f64,
    /// Scale factor applied to reach the target resolution (>= 1.0).
    pub scale: f64,
    /// Output raster width in pixels.
    pub pixel_width: u32,
    /// Output raster height in pixels.
    pub pixel_height: u32,
    /// Resolution actually achieved at `scale`, in dots per inch.
    pub effective_dpi: f64,
}

/// Pixel dimension of a natural length at the given scale.
///
/// Fractional remainders are truncated, not rounded. Shared with the
/// rasterizer backend so raster buffers always match planned geometry.
pub fn scaled_dimension(natural: f64, scale: f64) -> u32 {
    (natural * scale).trunc() as u32
}

/// Plan the output geometry for one page.
///
/// The baseline DPI is the ratio of the page diagonal to the Letter
/// diagonal — a resolution-equivalence heuristic, not a claim that the
/// page is physically Letter-sized. If the baseline already meets
/// `target_dpi` (within [`DPI_EPSILON`]) the page is left at scale
/// 1.0; it is never scaled down.
///
/// # Arguments
/// * `natural_width` - page width at unit scale, must be > 0
/// * `natural_height` - page height at unit scale, must be > 0
/// * `target_dpi` - desired minimum resolution, must be > 0
///
/// # Returns
/// * `Ok(PageGeometry)` with positive pixel dimensions
/// * `Err(Error::DegeneratePage)` for non-positive page dimensions
/// * `Err(Error::InvalidOptions)` for a non-positive target DPI
pub fn plan(natural_width: f64, natural_height: f64, target_dpi: f64) -> Result<PageGeometry> {
    if !target_dpi.is_finite() || target_dpi <= 0.0 {
        return Err(Error::InvalidOptions(format!(
            "target DPI must be positive, got {target_dpi}"
        )));
    }
    if !natural_width.is_finite()
        || !natural_height.is_finite()
        || natural_width <= 0.0
        || natural_height <= 0.0
    {
        return Err(Error::DegeneratePage {
            width: natural_width,
            height: natural_height,
        });
    }

    let page_diagonal = (natural_width * natural_width + natural_height * natural_height).sqrt();
    let reference_diagonal = (REFERENCE_WIDTH_IN * REFERENCE_WIDTH_IN
        + REFERENCE_HEIGHT_IN * REFERENCE_HEIGHT_IN)
        .sqrt();
    let baseline_dpi = page_diagonal / reference_diagonal;

    let scale = if baseline_dpi < target_dpi - DPI_EPSILON {
        target_dpi / baseline_dpi
    } else {
        1.0
    };

    let pixel_width = scaled_dimension(natural_width, scale);
    let pixel_height = scaled_dimension(natural_height, scale);
    if pixel_width == 0 || pixel_height == 0 {
        // Sub-pixel pages truncate to nothing; treat as degenerate
        // rather than emitting a zero-sized raster.
        return Err(Error::DegeneratePage {
            width: natural_width,
            height: natural_height,
        });
    }

    Ok(PageGeometry {
        natural_width,
        natural_height,
        scale,
        pixel_width,
        pixel_height,
        effective_dpi: baseline_dpi * scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_page_at_600_dpi() {
        // 612x792 points is Letter at 72 units per inch
        let geom = plan(612.0, 792.0, 600.0).unwrap();
        assert!((geom.scale - 600.0 / 72.0).abs() < 1e-9);
        assert_eq!(geom.pixel_width, 5100);
        assert_eq!(geom.pixel_height, 6600);
        assert!((geom.effective_dpi - 600.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_upscale_when_target_met() {
        // Baseline DPI for Letter points is exactly 72
        let geom = plan(612.0, 792.0, 72.0).unwrap();
        assert_eq!(geom.scale, 1.0);
        assert_eq!(geom.pixel_width, 612);
        assert_eq!(geom.pixel_height, 792);
        assert!((geom.effective_dpi - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_epsilon_prevents_marginal_upscale() {
        // Target just inside the 0.1 tolerance stays at scale 1.0
        let geom = plan(612.0, 792.0, 72.05).unwrap();
        assert_eq!(geom.scale, 1.0);
    }

    #[test]
    fn test_never_scales_down() {
        let geom = plan(6120.0, 7920.0, 72.0).unwrap();
        assert_eq!(geom.scale, 1.0);
        assert_eq!(geom.pixel_width, 6120);
        assert_eq!(geom.pixel_height, 7920);
    }

    #[test]
    fn test_planning_is_deterministic() {
        let a = plan(612.0, 792.0, 300.0).unwrap();
        let b = plan(612.0, 792.0, 300.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_monotonic_in_target_dpi() {
        let mut previous_scale = 0.0;
        for target in [50.0, 72.0, 150.0, 300.0, 600.0, 1200.0] {
            let geom = plan(595.0, 842.0, target).unwrap();
            assert!(geom.scale >= previous_scale);
            previous_scale = geom.scale;
        }
    }

    #[test]
    fn test_pixel_dimensions_truncate() {
        // scale 1.0, fractional natural size drops the remainder
        let geom = plan(100.9, 200.9, 1.0).unwrap();
        assert_eq!(geom.pixel_width, 100);
        assert_eq!(geom.pixel_height, 200);
    }

    #[test]
    fn test_degenerate_page_rejected() {
        assert!(matches!(
            plan(0.0, 792.0, 300.0),
            Err(Error::DegeneratePage { .. })
        ));
        assert!(matches!(
            plan(612.0, -1.0, 300.0),
            Err(Error::DegeneratePage { .. })
        ));
        assert!(matches!(
            plan(f64::NAN, 792.0, 300.0),
            Err(Error::DegeneratePage { .. })
        ));
    }

    #[test]
    fn test_invalid_target_dpi_rejected() {
        assert!(matches!(
            plan(612.0, 792.0, 0.0),
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            plan(612.0, 792.0, f64::INFINITY),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_varying_page_sizes_plan_independently() {
        let small = plan(300.0, 400.0, 300.0).unwrap();
        let large = plan(1224.0, 1584.0, 300.0).unwrap();
        // Each page gets its own scale; the small page needs more
        assert!(small.scale > large.scale);
        assert!((small.effective_dpi - 300.0).abs() < 1e-6);
        assert!((large.effective_dpi - 300.0).abs() < 1e-6);
    }
}
