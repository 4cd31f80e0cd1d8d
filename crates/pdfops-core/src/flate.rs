//! Flate (zlib) encoding for stream data

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::PdfOpsError;

/// Deflate `data` at the best compression level.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfOpsError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder
        .write_all(data)
        .map_err(|e| PdfOpsError::OperationError(format!("Failed to deflate stream: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| PdfOpsError::OperationError(format!("Failed to deflate stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    #[test]
    fn test_deflate_is_zlib() {
        let data = b"BT /F1 12 Tf 50 700 Td (hello) Tj ET ".repeat(20);
        let encoded = deflate(&data).unwrap();
        assert!(encoded.len() < data.len());

        let mut decoded = Vec::new();
        ZlibDecoder::new(encoded.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }
}
