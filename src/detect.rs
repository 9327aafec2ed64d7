//! Source format detection and validation.
//!
//! Sniffs the PDF magic header before the rendering backend sees the
//! file, so obviously wrong input is classified as a malformed source
//! rather than surfacing as an opaque renderer failure.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Source format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Detect the source format from a file path.
///
/// # Returns
/// * `Ok(PdfFormat)` if the file starts with a valid PDF header
/// * `Err(Error::MalformedSource)` otherwise
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(&path).map_err(|e| Error::SourceIo(e.to_string()))?;
    // read_to_end keeps reading until EOF, so a short read cannot
    // misclassify a valid header.
    let mut header = Vec::with_capacity(16);
    file.take(16)
        .read_to_end(&mut header)
        .map_err(|e| Error::SourceIo(e.to_string()))?;
    detect_format_from_bytes(&header)
}

/// Detect the source format from bytes.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::MalformedSource(
            "file does not start with a PDF header".into(),
        ));
    }

    let version_bytes = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    if !is_valid_version(&version) {
        return Err(Error::MalformedSource(format!(
            "unrecognized PDF version marker: {version}"
        )));
    }

    Ok(PdfFormat { version })
}

/// Check if a version string looks like "1.0" through "9.9".
fn is_valid_version(version: &str) -> bool {
    let chars: Vec<char> = version.chars().collect();
    chars.len() == 3 && chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes represent a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.version, "1.7");
        assert_eq!(format.to_string(), "PDF 1.7");
    }

    #[test]
    fn test_detect_pdf_2_0() {
        let data = b"%PDF-2.0\n%\xe2\xe3\xcf\xd3";
        let format = detect_format_from_bytes(data).unwrap();
        assert_eq!(format.version, "2.0");
    }

    #[test]
    fn test_detect_invalid_format() {
        let result = detect_format_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::MalformedSource(_))));
    }

    #[test]
    fn test_detect_too_short() {
        let result = detect_format_from_bytes(b"%PDF");
        assert!(matches!(result, Err(Error::MalformedSource(_))));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
        assert!(!is_pdf_bytes(b""));
    }

    #[test]
    fn test_detect_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\nrest of file").unwrap();
        assert_eq!(detect_format_from_path(&path).unwrap().version, "1.4");
        assert!(is_pdf(&path));
    }

    #[test]
    fn test_detect_from_path_truncated_file() {
        // A file shorter than the header is malformed, not an I/O error
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stub.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        assert!(matches!(
            detect_format_from_path(&path),
            Err(Error::MalformedSource(_))
        ));
    }

    #[test]
    fn test_detect_missing_file_is_source_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.pdf");
        assert!(matches!(
            detect_format_from_path(&path),
            Err(Error::SourceIo(_))
        ));
    }

    #[test]
    fn test_version_validation() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("1.7"));
        assert!(is_valid_version("2.0"));
        assert!(!is_valid_version("abc"));
        assert!(!is_valid_version("10.0"));
    }
}
