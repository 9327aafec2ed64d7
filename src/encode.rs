//! Multi-page TIFF container writer with CCITT Group 4 compression.
//!
//! Writes a classic little-endian TIFF: one image file directory (IFD)
//! per page, each holding a single Group 4 encoded strip plus the
//! page's resolution metadata. Pages are appended in arrival order by
//! patching the previous directory's next-IFD link, so container order
//! always equals append order. The container is not readable until
//! [`TiffWriter::finalize`] has flushed it.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use fax::encoder::Encoder;
use fax::{decoder, Color, VecWriter};

use crate::error::{Error, Result};
use crate::meta::PageMetadata;
use crate::raster::BitonalPage;

// Baseline TIFF tags used for a bitonal fax page.
const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_PHOTOMETRIC: u16 = 262;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_X_RESOLUTION: u16 = 282;
const TAG_Y_RESOLUTION: u16 = 283;
const TAG_RESOLUTION_UNIT: u16 = 296;

const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;

/// CCITT T.6 (Group 4 fax) compression tag value.
const COMPRESSION_GROUP4: u16 = 4;
/// PhotometricInterpretation required for CCITT data: 0 is white.
const PHOTOMETRIC_WHITE_IS_ZERO: u16 = 0;

/// Entries per page directory; must match what `write_ifd` emits.
const IFD_ENTRY_COUNT: u16 = 12;

/// Byte offset of the first-IFD link in the file header.
const HEADER_IFD_LINK: u64 = 4;

/// Group 4 encode a bitonal page into a single strip.
fn encode_group4(page: &BitonalPage) -> Result<Vec<u8>> {
    if page.width() > u16::MAX as u32 || page.height() > u16::MAX as u32 {
        return Err(Error::Encode(format!(
            "page raster {}x{} exceeds the Group 4 coding limit",
            page.width(),
            page.height()
        )));
    }
    let mut encoder = Encoder::new(VecWriter::new());
    for y in 0..page.height() {
        encoder
            .encode_line(page.row_colors(y), page.width() as u16)
            .map_err(|e| Error::Encode(format!("Group 4 line encoding failed: {e}")))?;
    }
    let writer = encoder
        .finish()
        .map_err(|e| Error::Encode(format!("Group 4 stream finish failed: {e}")))?;
    // Pads the trailing partial byte so the strip is whole bytes.
    Ok(writer.finish())
}

/// Verify that the Group 4 codec round-trips in this build.
///
/// Encodes a small known raster and decodes it back, comparing every
/// pixel. Run eagerly, before the input document is opened, so a
/// broken codec environment aborts with zero pages written.
///
/// # Returns
/// * `Err(Error::CapabilityMissing)` if the self-test fails.
pub fn verify_group4() -> Result<()> {
    let mut page = BitonalPage::new(8, 8).map_err(|e| {
        Error::CapabilityMissing(format!("Group 4 self-test raster unavailable: {e}"))
    })?;
    for y in 2..6 {
        for x in 2..6 {
            page.set_pixel(x, y, false);
        }
    }

    let encoded = encode_group4(&page)
        .map_err(|e| Error::CapabilityMissing(format!("Group 4 encoder self-test failed: {e}")))?;

    let mut decoded_rows: Vec<Vec<bool>> = Vec::new();
    decoder::decode_g4(encoded.iter().copied(), 8, Some(8), |transitions| {
        decoded_rows.push(
            decoder::pels(transitions, 8)
                .map(|c| matches!(c, Color::White))
                .collect(),
        );
    })
    .ok_or_else(|| {
        Error::CapabilityMissing("Group 4 decoder self-test failed to decode".into())
    })?;

    if decoded_rows.len() != 8 {
        return Err(Error::CapabilityMissing(
            "Group 4 self-test produced wrong row count".into(),
        ));
    }
    for (y, row) in decoded_rows.iter().enumerate() {
        for (x, &white) in row.iter().enumerate() {
            if white != page.is_white(x as u32, y as u32) {
                return Err(Error::CapabilityMissing(
                    "Group 4 self-test round-trip mismatch".into(),
                ));
            }
        }
    }
    Ok(())
}

/// Streaming writer for the multi-page output container.
///
/// Creating the writer stores the file header; each appended page adds
/// its strip data, resolution values, and directory, then links the
/// directory into the chain. Peak memory stays at one encoded page.
pub struct TiffWriter<W: Write + Seek> {
    writer: W,
    pages: u32,
    /// File offset of the u32 link that should point at the next IFD:
    /// the header link before the first page, then the previous IFD's
    /// trailing link.
    pending_link: u64,
}

impl TiffWriter<BufWriter<File>> {
    /// Create the output container file and write its header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> TiffWriter<W> {
    /// Start a container on an arbitrary writer.
    pub fn new(mut writer: W) -> Result<Self> {
        // Little-endian byte order mark, magic 42, empty IFD link.
        writer.write_all(b"II")?;
        writer.write_all(&42u16.to_le_bytes())?;
        writer.write_all(&0u32.to_le_bytes())?;
        Ok(Self {
            writer,
            pages: 0,
            pending_link: HEADER_IFD_LINK,
        })
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> u32 {
        self.pages
    }

    /// Append one page to the end of the container.
    ///
    /// The first page initializes the directory chain; later pages are
    /// linked after the previous one, preserving arrival order. The
    /// raster is consumed by value only in the sense that its encoded
    /// form is written immediately; the caller should drop it after
    /// this returns to bound peak memory.
    pub fn append_page(&mut self, page: &BitonalPage, meta: &PageMetadata) -> Result<()> {
        let strip = encode_group4(page)?;

        self.align_even()?;
        let strip_offset = self.stream_position()?;
        self.writer.write_all(&strip)?;
        let strip_len = strip.len() as u64;
        drop(strip);

        self.align_even()?;
        let x_res_offset = self.stream_position()?;
        self.write_u32(meta.x_resolution.numerator)?;
        self.write_u32(meta.x_resolution.denominator)?;
        let y_res_offset = self.stream_position()?;
        self.write_u32(meta.y_resolution.numerator)?;
        self.write_u32(meta.y_resolution.denominator)?;

        let ifd_offset = self.stream_position()?;
        self.write_ifd(
            page,
            meta,
            as_u32_offset(strip_offset)?,
            as_u32_offset(strip_len)?,
            as_u32_offset(x_res_offset)?,
            as_u32_offset(y_res_offset)?,
        )?;
        let next_link = self.stream_position()?;
        self.write_u32(0)?;

        // Link the new directory into the chain and return to the end.
        let link = self.pending_link;
        self.writer.seek(SeekFrom::Start(link))?;
        self.write_u32(as_u32_offset(ifd_offset)?)?;
        self.writer.seek(SeekFrom::End(0))?;

        self.pending_link = next_link;
        self.pages += 1;
        log::debug!(
            "appended page {} ({}x{} px, {} dpi)",
            self.pages,
            page.width(),
            page.height(),
            meta.x_resolution.numerator
        );
        Ok(())
    }

    /// Flush and close the container, exactly once.
    ///
    /// Consumes the writer; the container is only valid for reading
    /// after this returns.
    pub fn finalize(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_ifd(
        &mut self,
        page: &BitonalPage,
        meta: &PageMetadata,
        strip_offset: u32,
        strip_len: u32,
        x_res_offset: u32,
        y_res_offset: u32,
    ) -> Result<()> {
        self.write_u16(IFD_ENTRY_COUNT)?;
        // Entries must be sorted by tag number.
        self.entry_long(TAG_IMAGE_WIDTH, page.width())?;
        self.entry_long(TAG_IMAGE_LENGTH, page.height())?;
        self.entry_short(TAG_BITS_PER_SAMPLE, 1)?;
        self.entry_short(TAG_COMPRESSION, COMPRESSION_GROUP4)?;
        self.entry_short(TAG_PHOTOMETRIC, PHOTOMETRIC_WHITE_IS_ZERO)?;
        self.entry_long(TAG_STRIP_OFFSETS, strip_offset)?;
        self.entry_short(TAG_SAMPLES_PER_PIXEL, 1)?;
        self.entry_long(TAG_ROWS_PER_STRIP, page.height())?;
        self.entry_long(TAG_STRIP_BYTE_COUNTS, strip_len)?;
        self.entry_rational(TAG_X_RESOLUTION, x_res_offset)?;
        self.entry_rational(TAG_Y_RESOLUTION, y_res_offset)?;
        self.entry_short(TAG_RESOLUTION_UNIT, meta.unit as u16)?;
        Ok(())
    }

    fn entry_short(&mut self, tag: u16, value: u16) -> Result<()> {
        self.write_u16(tag)?;
        self.write_u16(TYPE_SHORT)?;
        self.write_u32(1)?;
        self.write_u16(value)?;
        self.write_u16(0)?;
        Ok(())
    }

    fn entry_long(&mut self, tag: u16, value: u32) -> Result<()> {
        self.write_u16(tag)?;
        self.write_u16(TYPE_LONG)?;
        self.write_u32(1)?;
        self.write_u32(value)?;
        Ok(())
    }

    fn entry_rational(&mut self, tag: u16, value_offset: u32) -> Result<()> {
        self.write_u16(tag)?;
        self.write_u16(TYPE_RATIONAL)?;
        self.write_u32(1)?;
        self.write_u32(value_offset)?;
        Ok(())
    }

    /// Pad with a zero byte so the next value starts on a word boundary.
    fn align_even(&mut self) -> Result<()> {
        if self.stream_position()? % 2 == 1 {
            self.writer.write_all(&[0u8])?;
        }
        Ok(())
    }

    fn stream_position(&mut self) -> Result<u64> {
        Ok(self.writer.stream_position()?)
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_all(&value.to_le_bytes())?;
        Ok(())
    }
}

/// Classic TIFF offsets are 32-bit; anything past 4 GiB is an error.
fn as_u32_offset(value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::Encode("output exceeds the 4 GiB classic TIFF limit".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_u16(data: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([data[offset], data[offset + 1]])
    }

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    /// Find the IFD entry with `tag` and return its value/offset field.
    fn find_entry(data: &[u8], ifd: usize, tag: u16) -> Option<(u16, u32)> {
        let count = read_u16(data, ifd) as usize;
        for i in 0..count {
            let entry = ifd + 2 + i * 12;
            if read_u16(data, entry) == tag {
                let field_type = read_u16(data, entry + 2);
                let value = match field_type {
                    TYPE_SHORT => read_u16(data, entry + 8) as u32,
                    _ => read_u32(data, entry + 8),
                };
                return Some((field_type, value));
            }
        }
        None
    }

    fn sample_page(width: u32, height: u32) -> BitonalPage {
        let mut page = BitonalPage::new(width, height).unwrap();
        for x in 0..width.min(height) {
            page.set_pixel(x, x % height, false);
        }
        page
    }

    #[test]
    fn test_verify_group4() {
        verify_group4().unwrap();
    }

    #[test]
    fn test_header_layout() {
        let writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
        let data = writer.finalize().unwrap().into_inner();
        assert_eq!(&data[0..2], b"II");
        assert_eq!(read_u16(&data, 2), 42);
        // No pages appended: the first-IFD link stays empty
        assert_eq!(read_u32(&data, 4), 0);
    }

    #[test]
    fn test_single_page_directory() {
        let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
        let page = sample_page(40, 30);
        let meta = PageMetadata::from_dpi(300.0).unwrap();
        writer.append_page(&page, &meta).unwrap();
        assert_eq!(writer.page_count(), 1);
        let data = writer.finalize().unwrap().into_inner();

        let ifd = read_u32(&data, 4) as usize;
        assert!(ifd > 8);
        assert_eq!(ifd % 2, 0);
        assert_eq!(read_u16(&data, ifd), IFD_ENTRY_COUNT);

        assert_eq!(find_entry(&data, ifd, TAG_IMAGE_WIDTH).unwrap().1, 40);
        assert_eq!(find_entry(&data, ifd, TAG_IMAGE_LENGTH).unwrap().1, 30);
        assert_eq!(find_entry(&data, ifd, TAG_BITS_PER_SAMPLE).unwrap().1, 1);
        assert_eq!(
            find_entry(&data, ifd, TAG_COMPRESSION).unwrap().1,
            COMPRESSION_GROUP4 as u32
        );
        assert_eq!(find_entry(&data, ifd, TAG_PHOTOMETRIC).unwrap().1, 0);
        assert_eq!(find_entry(&data, ifd, TAG_SAMPLES_PER_PIXEL).unwrap().1, 1);
        assert_eq!(find_entry(&data, ifd, TAG_ROWS_PER_STRIP).unwrap().1, 30);
        assert_eq!(find_entry(&data, ifd, TAG_RESOLUTION_UNIT).unwrap().1, 2);

        // Rational resolution values live at their recorded offsets
        let (ty, x_off) = find_entry(&data, ifd, TAG_X_RESOLUTION).unwrap();
        assert_eq!(ty, TYPE_RATIONAL);
        assert_eq!(read_u32(&data, x_off as usize), 300);
        assert_eq!(read_u32(&data, x_off as usize + 4), 1);

        // Terminal next-IFD link
        let next = read_u32(&data, ifd + 2 + IFD_ENTRY_COUNT as usize * 12);
        assert_eq!(next, 0);
    }

    #[test]
    fn test_strip_round_trips_through_group4() {
        let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
        let page = sample_page(64, 48);
        let meta = PageMetadata::from_dpi(200.0).unwrap();
        writer.append_page(&page, &meta).unwrap();
        let data = writer.finalize().unwrap().into_inner();

        let ifd = read_u32(&data, 4) as usize;
        let strip_offset = find_entry(&data, ifd, TAG_STRIP_OFFSETS).unwrap().1 as usize;
        let strip_len = find_entry(&data, ifd, TAG_STRIP_BYTE_COUNTS).unwrap().1 as usize;
        let strip = &data[strip_offset..strip_offset + strip_len];

        let mut rows: Vec<Vec<bool>> = Vec::new();
        decoder::decode_g4(strip.iter().copied(), 64, Some(48), |transitions| {
            rows.push(
                decoder::pels(transitions, 64)
                    .map(|c| matches!(c, Color::White))
                    .collect(),
            );
        })
        .expect("strip must decode");

        assert_eq!(rows.len(), 48);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), 64);
            for (x, &white) in row.iter().enumerate() {
                assert_eq!(white, page.is_white(x as u32, y as u32), "pixel {x},{y}");
            }
        }
    }

    #[test]
    fn test_pages_chain_in_append_order() {
        let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
        let widths = [32u32, 48, 64];
        for (i, &w) in widths.iter().enumerate() {
            let page = sample_page(w, 20);
            let meta = PageMetadata::from_dpi(100.0 * (i as f64 + 1.0)).unwrap();
            writer.append_page(&page, &meta).unwrap();
        }
        assert_eq!(writer.page_count(), 3);
        let data = writer.finalize().unwrap().into_inner();

        let mut ifd = read_u32(&data, 4) as usize;
        let mut seen = Vec::new();
        loop {
            seen.push(find_entry(&data, ifd, TAG_IMAGE_WIDTH).unwrap().1);
            let next = read_u32(&data, ifd + 2 + IFD_ENTRY_COUNT as usize * 12);
            if next == 0 {
                break;
            }
            ifd = next as usize;
        }
        assert_eq!(seen, vec![32, 48, 64]);
    }

    #[test]
    fn test_per_page_resolution_is_independent() {
        let mut writer = TiffWriter::new(Cursor::new(Vec::new())).unwrap();
        for dpi in [150.0, 600.0] {
            let page = sample_page(16, 16);
            let meta = PageMetadata::from_dpi(dpi).unwrap();
            writer.append_page(&page, &meta).unwrap();
        }
        let data = writer.finalize().unwrap().into_inner();

        let first = read_u32(&data, 4) as usize;
        let (_, x_off) = find_entry(&data, first, TAG_X_RESOLUTION).unwrap();
        assert_eq!(read_u32(&data, x_off as usize), 150);

        let second = read_u32(&data, first + 2 + IFD_ENTRY_COUNT as usize * 12) as usize;
        let (_, x_off) = find_entry(&data, second, TAG_X_RESOLUTION).unwrap();
        assert_eq!(read_u32(&data, x_off as usize), 600);
    }

    #[test]
    fn test_oversized_raster_rejected() {
        let page = BitonalPage::new(70_000, 1).unwrap();
        assert!(matches!(encode_group4(&page), Err(Error::Encode(_))));
    }
}
