//! Password removal
//!
//! The standard security handler decrypts strings and streams in place;
//! once that is done the in-memory document is plain, so dropping the
//! `/Encrypt` entry and re-serializing yields an unprotected file.
//!
//! Either the user or the owner password unlocks a file. RC4 (40 to 128
//! bit) and AES (128 and 256 bit) crypt filters are supported.

use lopdf::Document;
use tracing::debug;

use crate::error::PdfOpsError;
use crate::security;

/// Load `bytes` and decrypt it with `password`.
///
/// Documents without an `/Encrypt` dictionary are returned unchanged,
/// whatever the password.
pub fn decrypt_document(bytes: &[u8], password: &str) -> Result<Document, PdfOpsError> {
    let mut doc = Document::load_mem(bytes).map_err(PdfOpsError::from_load)?;

    if !security::unlock(&mut doc, password.as_bytes())? {
        debug!("Document is not encrypted, passing through");
    }

    Ok(doc)
}

/// Decrypt and serialize in one step.
pub fn decrypt_pdf(bytes: &[u8], password: &str) -> Result<Vec<u8>, PdfOpsError> {
    let mut doc = decrypt_document(bytes, password)?;
    crate::save_to_vec(&mut doc)
}
