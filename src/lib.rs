//! # faxtiff
//!
//! Convert paginated PDF documents into multi-page CCITT Group 4 fax
//! TIFF images, optimized for fax-grade transmission and
//! print-accurate scaling.
//!
//! Each source page is scaled so its raster meets a target resolution
//! (using a diagonal-length heuristic against US Letter paper),
//! rendered to a strictly black/white raster, and appended to a single
//! multi-page TIFF with per-page X/Y resolution metadata.
//!
//! ## Quick Start
//!
//! ```no_run
//! use faxtiff::{convert_file, ConvertOptions};
//!
//! fn main() -> faxtiff::Result<()> {
//!     let options = ConvertOptions::new().with_printer_dpi(600.0);
//!     let summary = convert_file("invoice.pdf", "invoice.tif", &options)?;
//!     println!("wrote {} pages", summary.pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Group 4 fax compression**: every page is a lossless CCITT T.6
//!   strip, decodable by standard bitonal TIFF readers
//! - **Print-accurate scaling**: pages are scaled up (never down) to
//!   meet the target DPI, with the achieved resolution tagged per page
//! - **All-or-nothing batch contract**: any failure removes the
//!   partial output file
//! - **Pluggable rasterization**: the `DocumentSource` trait isolates
//!   the pdfium backend from the planning and encoding logic

pub mod convert;
pub mod detect;
pub mod encode;
pub mod error;
pub mod meta;
pub mod plan;
pub mod raster;
pub mod source;

// Re-export commonly used types
pub use convert::{convert_to_file, convert_to_writer, ConvertOptions, ConvertSummary};
pub use error::{Error, Result};
pub use meta::{PageMetadata, Rational, ResolutionUnit};
pub use plan::PageGeometry;
pub use raster::BitonalPage;
pub use source::{DocumentSource, PageSize};

#[cfg(feature = "pdfium")]
use std::path::Path;

/// Convert a PDF file into a multi-page Group 4 TIFF.
///
/// Runs the eager codec capability check, classifies the input
/// (existence and PDF header), opens the document with the pdfium
/// backend, and converts every page. On any failure the partial
/// output file is removed.
///
/// # Arguments
///
/// * `input` - Path to the source PDF
/// * `output` - Path for the produced TIFF
/// * `options` - Resolution targets and rotation
///
/// # Example
///
/// ```no_run
/// use faxtiff::{convert_file, ConvertOptions};
///
/// let summary = convert_file("scan.pdf", "scan.tif", &ConvertOptions::default()).unwrap();
/// assert!(summary.pages > 0);
/// ```
#[cfg(feature = "pdfium")]
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
) -> Result<ConvertSummary> {
    convert_file_with_password(input, output, options, None)
}

/// Convert a password-protected PDF file.
///
/// Same contract as [`convert_file`], supplying a document password
/// to the rendering backend.
#[cfg(feature = "pdfium")]
pub fn convert_file_with_password<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
    password: Option<&str>,
) -> Result<ConvertSummary> {
    let input = input.as_ref();
    options.validate()?;

    // Environment check first: a missing codec aborts before the
    // input document is even opened.
    encode::verify_group4()?;

    if !input.is_file() {
        return Err(Error::InputNotFound(input.to_path_buf()));
    }
    detect::detect_format_from_path(input)?;

    let pdfium = source::bind_renderer()?;
    let document = source::PdfiumSource::open(&pdfium, input, password)?;
    convert_to_file(&document, output.as_ref(), options)
}

/// Builder for configuring and running conversions.
///
/// # Example
///
/// ```no_run
/// use faxtiff::FaxTiff;
///
/// let summary = FaxTiff::new()
///     .with_printer_dpi(600.0)
///     .with_fax_dpi(400.0)
///     .convert("document.pdf", "document.tif")?;
/// # Ok::<(), faxtiff::Error>(())
/// ```
#[cfg(feature = "pdfium")]
pub struct FaxTiff {
    options: ConvertOptions,
    password: Option<String>,
}

#[cfg(feature = "pdfium")]
impl FaxTiff {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
            password: None,
        }
    }

    /// Set the printer target resolution in DPI.
    pub fn with_printer_dpi(mut self, dpi: f64) -> Self {
        self.options = self.options.with_printer_dpi(dpi);
        self
    }

    /// Set the fax target resolution in DPI.
    pub fn with_fax_dpi(mut self, dpi: f64) -> Self {
        self.options = self.options.with_fax_dpi(dpi);
        self
    }

    /// Set the document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Run the conversion.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
    ) -> Result<ConvertSummary> {
        convert_file_with_password(input, output, &self.options, self.password.as_deref())
    }
}

#[cfg(feature = "pdfium")]
impl Default for FaxTiff {
    fn default() -> Self {
        Self::new()
    }
}
