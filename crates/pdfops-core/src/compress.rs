//! Stream recompression
//!
//! Two passes over every stream object:
//! - `recompress_flate`: decode streams whose only filter is FlateDecode and
//!   re-encode them at the best level
//! - `compress_streams`: Flate-encode streams that carry no filter at all
//!
//! A new encoding is kept only when it is smaller than the current one, so
//! the output never grows stream by stream.

use lopdf::{Document, Object, Stream};
use tracing::debug;

use crate::error::PdfOpsError;
use crate::flate::deflate;
use crate::security;

/// Which recompression passes to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    pub recompress_flate: bool,
    pub compress_streams: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            recompress_flate: true,
            compress_streams: true,
        }
    }
}

/// Per-document counters, logged by callers
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompressStats {
    pub recompressed: usize,
    pub compressed: usize,
    pub unchanged: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum StreamEncoding {
    Raw,
    FlateOnly,
    Other,
}

fn stream_encoding(stream: &Stream) -> StreamEncoding {
    match stream.dict.get(b"Filter") {
        Err(_) => StreamEncoding::Raw,
        Ok(Object::Name(name)) if name == b"FlateDecode" => StreamEncoding::FlateOnly,
        Ok(Object::Array(filters)) if filters.is_empty() => StreamEncoding::Raw,
        Ok(Object::Array(filters)) if filters.len() == 1 => match &filters[0] {
            Object::Name(name) if name == b"FlateDecode" => StreamEncoding::FlateOnly,
            _ => StreamEncoding::Other,
        },
        _ => StreamEncoding::Other,
    }
}

fn is_xref_stream(stream: &Stream) -> bool {
    matches!(stream.dict.get(b"Type"), Ok(Object::Name(name)) if name == b"XRef")
}

/// Recompress the streams of a loaded document in place.
pub fn compress_streams(
    doc: &mut Document,
    options: CompressOptions,
) -> Result<CompressStats, PdfOpsError> {
    let mut stats = CompressStats::default();

    for object in doc.objects.values_mut() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if is_xref_stream(stream) {
            stats.unchanged += 1;
            continue;
        }

        match stream_encoding(stream) {
            // Predictor parameters would have to be re-applied; leave those alone
            StreamEncoding::FlateOnly
                if options.recompress_flate && stream.dict.get(b"DecodeParms").is_err() =>
            {
                let Ok(decoded) = stream.decompressed_content() else {
                    stats.unchanged += 1;
                    continue;
                };
                let encoded = deflate(&decoded)?;
                if encoded.len() < stream.content.len() {
                    stream
                        .dict
                        .set("Filter", Object::Name(b"FlateDecode".to_vec()));
                    stream.set_content(encoded);
                    stats.recompressed += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
            StreamEncoding::Raw
                if options.compress_streams
                    && stream.allows_compression
                    && !stream.content.is_empty() =>
            {
                let encoded = deflate(&stream.content)?;
                if encoded.len() < stream.content.len() {
                    stream
                        .dict
                        .set("Filter", Object::Name(b"FlateDecode".to_vec()));
                    stream.set_content(encoded);
                    stats.compressed += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
            _ => stats.unchanged += 1,
        }
    }

    Ok(stats)
}

/// Load `bytes` and recompress its streams.
///
/// Encrypted documents are opened with the empty user password, which
/// covers owner-only protection; the output is then unencrypted. Files that
/// need a real password are refused.
pub fn compress_document(
    bytes: &[u8],
    options: CompressOptions,
) -> Result<(Document, CompressStats), PdfOpsError> {
    let mut doc = Document::load_mem(bytes).map_err(PdfOpsError::from_load)?;
    match security::unlock(&mut doc, b"") {
        Ok(true) => debug!("Opened owner-protected document with the empty password"),
        Ok(false) => {}
        Err(PdfOpsError::InvalidPassword) => return Err(PdfOpsError::Encrypted),
        Err(e) => return Err(e),
    }

    let stats = compress_streams(&mut doc, options)?;
    debug!(
        recompressed = stats.recompressed,
        compressed = stats.compressed,
        unchanged = stats.unchanged,
        "Recompressed document streams"
    );

    Ok((doc, stats))
}

/// Recompress and serialize in one step.
pub fn compress_pdf(bytes: &[u8], options: CompressOptions) -> Result<Vec<u8>, PdfOpsError> {
    let (mut doc, _) = compress_document(bytes, options)?;
    crate::save_to_vec(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encrypted_pdf, encrypted_pdf_with, sample_document, sample_pdf, Protection};
    use lopdf::Dictionary;
    use pretty_assertions::assert_eq;

    fn page_contents(doc: &Document) -> Vec<Vec<u8>> {
        doc.get_pages()
            .values()
            .map(|&id| doc.get_page_content(id).unwrap())
            .collect()
    }

    #[test]
    fn test_compress_preserves_pages_and_content() {
        let pdf = sample_pdf(4, "Keep");
        let before = Document::load_mem(&pdf).unwrap();

        let out = compress_pdf(&pdf, CompressOptions::default()).unwrap();
        let after = Document::load_mem(&out).unwrap();

        assert_eq!(after.get_pages().len(), 4);
        assert_eq!(page_contents(&after), page_contents(&before));
    }

    #[test]
    fn test_raw_streams_get_flate_filter() {
        let mut doc = sample_document(1, "Raw");
        let payload = b"0 0 m 100 100 l S\n".repeat(64);
        let id = doc.add_object(Stream::new(Dictionary::new(), payload.clone()));

        let stats = compress_streams(&mut doc, CompressOptions::default()).unwrap();
        assert!(stats.compressed >= 1);

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"FlateDecode");
        assert_eq!(stream.decompressed_content().unwrap(), payload);
    }

    #[test]
    fn test_weak_flate_is_recompressed() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let payload = b"q 1 0 0 1 0 0 cm Q\n".repeat(200);
        let mut weak = ZlibEncoder::new(Vec::new(), Compression::none());
        weak.write_all(&payload).unwrap();
        let weak = weak.finish().unwrap();

        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        let mut doc = sample_document(1, "Weak");
        let id = doc.add_object(Stream::new(dict, weak.clone()));

        let only_flate = CompressOptions {
            recompress_flate: true,
            compress_streams: false,
        };
        let stats = compress_streams(&mut doc, only_flate).unwrap();
        assert_eq!(stats.recompressed, 1);

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert!(stream.content.len() < weak.len());
        assert_eq!(stream.decompressed_content().unwrap(), payload);
    }

    #[test]
    fn test_disabled_passes_leave_streams_alone() {
        let mut doc = sample_document(2, "Off");
        let none = CompressOptions {
            recompress_flate: false,
            compress_streams: false,
        };

        let stats = compress_streams(&mut doc, none).unwrap();
        assert_eq!(stats.recompressed, 0);
        assert_eq!(stats.compressed, 0);
    }

    #[test]
    fn test_unknown_filters_are_untouched() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let mut doc = sample_document(1, "Jpeg");
        let id = doc.add_object(Stream::new(dict, vec![0xFF, 0xD8, 0xFF, 0xD9]));

        compress_streams(&mut doc, CompressOptions::default()).unwrap();

        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(stream.content, vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[test]
    fn test_encrypted_input_is_refused() {
        let pdf = encrypted_pdf(1, "Locked", "pw", "owner");
        let result = compress_pdf(&pdf, CompressOptions::default());
        assert!(matches!(result, Err(PdfOpsError::Encrypted)));
    }

    #[test]
    fn test_owner_only_protection_is_opened() {
        let pdf = encrypted_pdf(1, "X", "", "owner");

        let out = compress_pdf(&pdf, CompressOptions::default()).unwrap();
        let doc = Document::load_mem(&out).unwrap();

        assert!(!doc.is_encrypted());
        let content = String::from_utf8_lossy(&page_contents(&doc)[0]).into_owned();
        assert!(content.contains("(X-Page-1)"), "got {:?}", content);
    }

    #[test]
    fn test_owner_only_aes_is_opened() {
        let pdf = encrypted_pdf_with(2, "X", "", "owner", Protection::Aes128);

        let (doc, _) = compress_document(&pdf, CompressOptions::default()).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = compress_pdf(b"%PDF-1.4\nnot really", CompressOptions::default());
        assert!(matches!(result, Err(PdfOpsError::ParseError(_))));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::fixtures::sample_pdf;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: recompression keeps page count and decoded page content
        #[test]
        fn compress_is_content_preserving(pages in 1u32..12, prefix in "[A-Za-z]{1,12}") {
            let pdf = sample_pdf(pages, &prefix);
            let before = Document::load_mem(&pdf).unwrap();

            let out = compress_pdf(&pdf, CompressOptions::default()).unwrap();
            let after = Document::load_mem(&out).unwrap();

            prop_assert_eq!(after.get_pages().len(), pages as usize);
            for (&a, &b) in before.get_pages().values().zip(after.get_pages().values()) {
                prop_assert_eq!(
                    before.get_page_content(a).unwrap(),
                    after.get_page_content(b).unwrap()
                );
            }
        }
    }
}
