//! pdfium-backed document source.
//!
//! Binds the pdfium library (a local copy next to the executable if
//! present, otherwise the system library), loads the document, and
//! renders pages at the planned pixel dimensions. Rendered pages are
//! reduced to strict black/white with a hard luma threshold, so the
//! bitonality contract of [`DocumentSource`] holds regardless of any
//! anti-aliasing pdfium performs internally.

use std::path::Path;

use pdfium_render::prelude::*;

use crate::error::{Error, Result};
use crate::plan::scaled_dimension;
use crate::raster::{from_luma8, BitonalPage};
use crate::source::{DocumentSource, PageSize};

/// Bind the pdfium rendering library.
///
/// Tries a platform-named library in the working directory first, then
/// the system library. A missing library is an environment problem,
/// reported as [`Error::CapabilityMissing`].
pub fn bind_renderer() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::CapabilityMissing(format!("failed to bind pdfium library: {e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Map a pdfium document-load failure onto the error taxonomy.
fn classify_load_error(err: PdfiumError) -> Error {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            Error::UnsupportedSecurity("document password missing or incorrect".into())
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::SecurityError) => {
            Error::UnsupportedSecurity("document uses an unsupported security scheme".into())
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FileError) => {
            Error::SourceIo("pdfium could not read the source file".into())
        }
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::FormatError) => {
            Error::MalformedSource("document structure could not be parsed".into())
        }
        other => Error::MalformedSource(format!("pdfium load failure: {other:?}")),
    }
}

/// Only the fixed 0-degree pass-through rotation is rendered.
fn ensure_zero_rotation(rotation: f32) -> Result<()> {
    if rotation != 0.0 {
        return Err(Error::InvalidOptions(format!(
            "rotation {rotation} is not supported by the pdfium backend"
        )));
    }
    Ok(())
}

/// Concrete [`DocumentSource`] backed by a pdfium document.
///
/// Borrows the bound [`Pdfium`] instance for the duration of the run;
/// the document handle is released when the source is dropped.
pub struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumSource<'a> {
    /// Open a document from a file path.
    ///
    /// The password, if any, is borrowed by the loaded document and so
    /// must live as long as the pdfium binding.
    pub fn open(pdfium: &'a Pdfium, path: &Path, password: Option<&'a str>) -> Result<Self> {
        let document = pdfium
            .load_pdf_from_file(path, password)
            .map_err(classify_load_error)?;
        log::debug!(
            "opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Self { document })
    }

    fn page(&self, index: u32) -> Result<PdfPage<'_>> {
        let index = u16::try_from(index).map_err(|_| Error::Rasterize {
            page: index,
            reason: "page index out of range".into(),
        })?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| Error::SourceIo(format!("failed to load page {index}: {e:?}")))
    }
}

impl DocumentSource for PdfiumSource<'_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn page_size(&self, index: u32, rotation: f32, scale: f64) -> Result<PageSize> {
        ensure_zero_rotation(rotation)?;
        let page = self.page(index)?;
        Ok(PageSize {
            width: page.width().value as f64 * scale,
            height: page.height().value as f64 * scale,
        })
    }

    fn rasterize(&self, index: u32, rotation: f32, scale: f64) -> Result<BitonalPage> {
        ensure_zero_rotation(rotation)?;
        let page = self.page(index)?;

        let pixel_width = scaled_dimension(page.width().value as f64, scale);
        let pixel_height = scaled_dimension(page.height().value as f64, scale);
        let target_width = i32::try_from(pixel_width).map_err(|_| Error::Rasterize {
            page: index,
            reason: format!("raster width {pixel_width} out of range"),
        })?;
        let target_height = i32::try_from(pixel_height).map_err(|_| Error::Rasterize {
            page: index,
            reason: format!("raster height {pixel_height} out of range"),
        })?;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(target_width)
                    .set_target_height(target_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|e| Error::Rasterize {
                page: index,
                reason: format!("{e:?}"),
            })?;

        let gray = bitmap.as_image().to_luma8();
        log::trace!(
            "rendered page {} at {}x{} (scale {:.3})",
            index,
            gray.width(),
            gray.height(),
            scale
        );
        from_luma8(&gray)
    }
}
