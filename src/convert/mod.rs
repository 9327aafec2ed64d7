//! Conversion pipeline orchestration.
//!
//! Sequences planning, rasterization, metadata construction, and
//! container encoding across all pages of a document. The pipeline is
//! strictly sequential: the container's page-append operation is
//! ordered and stateful, so pages go in at index order 0..N-1 with no
//! reordering, gaps, or duplicates. Any per-page failure fails the
//! whole batch; there is no partial-success mode.

use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use crate::encode::TiffWriter;
use crate::error::{Error, Result};
use crate::meta::PageMetadata;
use crate::plan;
use crate::source::DocumentSource;

/// Options for a conversion run.
///
/// One immutable value threaded through the pipeline; the per-page
/// scale is recomputed from scratch for every page, so no state leaks
/// from one page to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertOptions {
    /// Printer target resolution in DPI; drives page scaling.
    pub printer_dpi: f64,

    /// Fax target resolution in DPI. Accepted and validated but not
    /// applied as a distinct scaling constraint; see DESIGN.md.
    pub fax_dpi: f64,

    /// Page rotation in degrees. Fixed pass-through; only 0 is
    /// supported by the bundled backend.
    pub rotation: f32,
}

impl ConvertOptions {
    /// Create options with the default resolutions (600/400 DPI).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the printer target resolution.
    pub fn with_printer_dpi(mut self, dpi: f64) -> Self {
        self.printer_dpi = dpi;
        self
    }

    /// Set the fax target resolution.
    pub fn with_fax_dpi(mut self, dpi: f64) -> Self {
        self.fax_dpi = dpi;
        self
    }

    /// Set the page rotation in degrees.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// The resolution that drives per-page planning.
    pub fn target_dpi(&self) -> f64 {
        self.printer_dpi
    }

    /// Validate the option values.
    pub fn validate(&self) -> Result<()> {
        for (name, dpi) in [("printer", self.printer_dpi), ("fax", self.fax_dpi)] {
            if !dpi.is_finite() || dpi <= 0.0 {
                return Err(Error::InvalidOptions(format!(
                    "{name} resolution must be a positive number, got {dpi}"
                )));
            }
        }
        if !self.rotation.is_finite() {
            return Err(Error::InvalidOptions("rotation must be finite".into()));
        }
        Ok(())
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            printer_dpi: 600.0,
            fax_dpi: 400.0,
            rotation: 0.0,
        }
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Number of pages written to the container.
    pub pages: u32,
    /// Path of the produced container file.
    pub output: PathBuf,
}

/// Convert every page of `source` into a container on `writer`.
///
/// Pages are processed in strictly increasing index order; for each
/// page the geometry is planned, the page rasterized at the planned
/// scale, tagged with metadata derived from its own effective DPI, and
/// appended. The container is finalized exactly once, after the last
/// page. The raster buffer is dropped as soon as the page is encoded,
/// bounding peak memory to one page.
///
/// # Returns
/// The page count and the finalized writer, or the first fatal error.
pub fn convert_to_writer<W: Write + Seek>(
    source: &dyn DocumentSource,
    writer: W,
    options: &ConvertOptions,
) -> Result<(u32, W)> {
    options.validate()?;

    let page_count = source.page_count();
    if page_count == 0 {
        return Err(Error::MalformedSource("document has no pages".into()));
    }
    log::debug!(
        "converting {page_count} pages at target {} dpi (fax parameter {} dpi)",
        options.printer_dpi,
        options.fax_dpi
    );

    let mut container = TiffWriter::new(writer)?;
    for index in 0..page_count {
        let size = source.page_size(index, options.rotation, 1.0)?;
        let geometry = plan::plan(size.width, size.height, options.target_dpi()).map_err(|e| {
            log::error!("page {index}: {e}");
            e
        })?;

        let raster = source.rasterize(index, options.rotation, geometry.scale)?;
        if raster.width() != geometry.pixel_width || raster.height() != geometry.pixel_height {
            return Err(Error::Rasterize {
                page: index,
                reason: format!(
                    "raster {}x{} does not match planned {}x{}",
                    raster.width(),
                    raster.height(),
                    geometry.pixel_width,
                    geometry.pixel_height
                ),
            });
        }

        let metadata = PageMetadata::from_dpi(geometry.effective_dpi)?;
        container.append_page(&raster, &metadata)?;
        // Raster dropped here; the next page gets a fresh buffer.
    }

    let pages = container.page_count();
    let writer = container.finalize()?;
    Ok((pages, writer))
}

/// Convert every page of `source` into a container file at `output`.
///
/// All-or-nothing: on any failure the partially written file is
/// removed (best effort) before the error propagates, so callers never
/// observe a file that looks complete but is not.
pub fn convert_to_file(
    source: &dyn DocumentSource,
    output: &Path,
    options: &ConvertOptions,
) -> Result<ConvertSummary> {
    options.validate()?;

    let file = fs::File::create(output)?;
    match convert_to_writer(source, std::io::BufWriter::new(file), options) {
        Ok((pages, writer)) => {
            writer
                .into_inner()
                .map_err(|e| Error::Io(e.into_error()))?
                .sync_all()?;
            log::info!("wrote {} pages to {}", pages, output.display());
            Ok(ConvertSummary {
                pages,
                output: output.to_path_buf(),
            })
        }
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(output) {
                log::warn!(
                    "could not remove partial output {}: {remove_err}",
                    output.display()
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ConvertOptions::new()
            .with_printer_dpi(300.0)
            .with_fax_dpi(204.0)
            .with_rotation(0.0);

        assert_eq!(options.printer_dpi, 300.0);
        assert_eq!(options.fax_dpi, 204.0);
        assert_eq!(options.target_dpi(), 300.0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_default_options() {
        let options = ConvertOptions::default();
        assert_eq!(options.printer_dpi, 600.0);
        assert_eq!(options.fax_dpi, 400.0);
        assert_eq!(options.rotation, 0.0);
    }

    #[test]
    fn test_target_dpi_follows_printer_resolution() {
        // The fax parameter is recorded but does not drive planning
        let options = ConvertOptions::new()
            .with_printer_dpi(600.0)
            .with_fax_dpi(9999.0);
        assert_eq!(options.target_dpi(), 600.0);
    }

    #[test]
    fn test_validate_rejects_bad_dpi() {
        assert!(matches!(
            ConvertOptions::new().with_printer_dpi(0.0).validate(),
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            ConvertOptions::new().with_fax_dpi(-1.0).validate(),
            Err(Error::InvalidOptions(_))
        ));
        assert!(matches!(
            ConvertOptions::new().with_printer_dpi(f64::NAN).validate(),
            Err(Error::InvalidOptions(_))
        ));
    }
}
