//! Declared media types accepted by each operation
//!
//! Checks run against the type the client declared for an upload, never
//! against sniffed content, so they can happen before any bytes are read.

/// Media types accepted by the decrypt and compress operations
pub const PDF_MEDIA_TYPES: &[&str] = &["application/pdf"];

/// Media types accepted by the images-to-PDF operation
pub const IMAGE_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/tiff",
    "image/bmp",
];

/// Media type of every artifact this crate produces
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Strip parameters (`; charset=...`) and normalize case.
pub fn essence(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True when `declared` names one of `allowed`.
pub fn is_allowed(declared: Option<&str>, allowed: &[&str]) -> bool {
    match declared {
        Some(declared) => {
            let essence = essence(declared);
            allowed.iter().any(|a| *a == essence)
        }
        None => false,
    }
}

pub fn is_pdf(declared: Option<&str>) -> bool {
    is_allowed(declared, PDF_MEDIA_TYPES)
}

pub fn is_image(declared: Option<&str>) -> bool {
    is_allowed(declared, IMAGE_MEDIA_TYPES)
}
