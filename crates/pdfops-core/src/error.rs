use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfOpsError {
    #[error("Invalid password for PDF file.")]
    InvalidPassword,

    #[error("PDF is encrypted; remove the password with /decryptPdf first")]
    Encrypted,

    #[error("Unsupported PDF encryption: {0}")]
    UnsupportedEncryption(String),

    #[error("Failed to decrypt PDF: {0}")]
    Decryption(String),

    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Failed to decode image {index}: {message}")]
    DecodeError { index: usize, message: String },

    #[error("Unsupported image mode: {0}")]
    UnsupportedMode(String),

    #[error("At least one image file is required.")]
    NoImages,

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}

impl PdfOpsError {
    /// Wrap a failure raised while loading a document.
    pub(crate) fn from_load(err: lopdf::Error) -> Self {
        PdfOpsError::ParseError(err.to_string())
    }
}
