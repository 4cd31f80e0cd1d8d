//! PDF unlock, recompression and image assembly
//!
//! This crate provides the document operations behind the pdfops server,
//! using lopdf for PDF structure and image for raster decoding:
//! - `decrypt_pdf`: remove password protection (RC4 and AES, user or owner
//!   password)
//! - `compress_pdf`: recompress Flate streams and compress raw streams
//! - `images_to_pdf`: one page per image, in order, in a chosen color mode

pub mod assemble;
pub mod compress;
pub mod decrypt;
pub mod error;
mod flate;
pub mod media;
pub mod modes;
mod security;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

use std::io::Write;

pub use assemble::{images_to_document, images_to_pdf};
pub use compress::{compress_document, compress_pdf, CompressOptions, CompressStats};
pub use decrypt::{decrypt_document, decrypt_pdf};
pub use error::PdfOpsError;
pub use modes::ColorMode;

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfOpsError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(PdfOpsError::from_load)?;
    Ok(doc.get_pages().len() as u32)
}

/// Serialize `doc` into `target`.
pub fn write_document<W: Write>(doc: &mut lopdf::Document, target: &mut W) -> Result<(), PdfOpsError> {
    doc.save_to(target)
        .map_err(|e| PdfOpsError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(())
}

pub(crate) fn save_to_vec(doc: &mut lopdf::Document) -> Result<Vec<u8>, PdfOpsError> {
    let mut buffer = Vec::new();
    write_document(doc, &mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_pdf;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(&sample_pdf(7, "Count")).unwrap(), 7);
    }

    #[test]
    fn test_page_count_rejects_garbage() {
        assert!(matches!(
            page_count(b"hello"),
            Err(PdfOpsError::ParseError(_))
        ));
    }

    #[test]
    fn test_write_document_roundtrips() {
        let mut doc = lopdf::Document::load_mem(&sample_pdf(2, "W")).unwrap();
        let mut out = Vec::new();
        write_document(&mut doc, &mut out).unwrap();
        assert!(out.starts_with(b"%PDF-1.5"));
        assert_eq!(page_count(&out).unwrap(), 2);
    }
}
