//! Document source abstraction layer.
//!
//! Provides a trait-based interface for the paginated source document,
//! isolating the concrete rendering library (pdfium) from the
//! planning and encoding logic. Any backend that can report page
//! geometry and produce strictly bitonal rasters can drive the
//! pipeline.

#[cfg(feature = "pdfium")]
mod pdfium;

#[cfg(feature = "pdfium")]
pub use pdfium::{bind_renderer, PdfiumSource};

use crate::error::Result;
use crate::raster::BitonalPage;

/// Natural size of a page, in abstract units at a given scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// Abstract interface for a paginated source document.
///
/// The rasterization contract is strict bitonality: every pixel of the
/// returned buffer is exactly black or exactly white, with no
/// anti-aliasing artifacts, and the buffer dimensions equal
/// [`crate::plan::scaled_dimension`] of the page's natural size at the
/// requested scale. Rasters may be large; callers drop each one as
/// soon as it has been encoded so peak memory stays at one page.
pub trait DocumentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Size of a page at the given rotation and scale.
    ///
    /// Scale 1.0 yields the page's natural size.
    fn page_size(&self, index: u32, rotation: f32, scale: f64) -> Result<PageSize>;

    /// Render a page to a bitonal raster at the given rotation and scale.
    fn rasterize(&self, index: u32, rotation: f32, scale: f64) -> Result<BitonalPage>;
}
