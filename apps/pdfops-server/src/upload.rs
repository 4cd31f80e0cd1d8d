//! Multipart intake
//!
//! A file part's declared content type is checked against the endpoint's
//! allow-list as soon as its headers arrive, before any of its bytes are
//! read. Nothing is decoded here.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use pdfops_core::media;
use tracing::debug;

use crate::error::ApiError;

/// Kind of file an endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

impl UploadKind {
    pub fn allowed(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Pdf => media::PDF_MEDIA_TYPES,
            UploadKind::Image => media::IMAGE_MEDIA_TYPES,
        }
    }

    fn rejection(&self, declared: Option<&str>) -> ApiError {
        let declared = declared.unwrap_or("none");
        match self {
            UploadKind::Pdf => ApiError::UnsupportedMediaType(format!(
                "Please upload PDF file format only (got {}).",
                declared
            )),
            UploadKind::Image => {
                ApiError::UnsupportedMediaType(format!("Unsupported image type: {}", declared))
            }
        }
    }
}

/// Shape of the form an endpoint expects
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    /// Name of the file part(s)
    pub file_field: &'static str,
    pub kind: UploadKind,
    /// Whether more than one file part is accepted
    pub multiple: bool,
}

impl FormSpec {
    pub const SINGLE_PDF: FormSpec = FormSpec {
        file_field: "file",
        kind: UploadKind::Pdf,
        multiple: false,
    };

    pub const IMAGES: FormSpec = FormSpec {
        file_field: "files",
        kind: UploadKind::Image,
        multiple: true,
    };
}

/// One uploaded file part
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Everything read from a form, file parts in submission order
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    texts: HashMap<String, String>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    /// The single required file part
    pub fn take_file(&mut self, spec: &FormSpec) -> Result<UploadedFile, ApiError> {
        self.files.pop().ok_or_else(|| {
            ApiError::MissingInput(format!(
                "Missing required file part '{}'",
                spec.file_field
            ))
        })
    }
}

/// Read a multipart body according to `spec`.
///
/// A request that is not a multipart form at all is reported as missing its
/// required fields.
pub async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    spec: &FormSpec,
) -> Result<UploadForm, ApiError> {
    let mut multipart = multipart.map_err(|rejection| ApiError::InvalidForm(rejection.body_text()))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == spec.file_field {
            let content_type = field.content_type().map(str::to_string);
            if !media::is_allowed(content_type.as_deref(), spec.kind.allowed()) {
                return Err(spec.kind.rejection(content_type.as_deref()));
            }
            if !spec.multiple && !form.files.is_empty() {
                return Err(ApiError::InvalidForm(format!(
                    "Expected a single '{}' part",
                    spec.file_field
                )));
            }

            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            debug!(
                field = %name,
                file_name = ?file_name,
                size = bytes.len(),
                "Received file part"
            );
            form.files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        } else if field.file_name().is_none() {
            let value = field.text().await?;
            form.texts.insert(name, value);
        } else {
            debug!(field = %name, "Skipping unexpected file part");
        }
    }

    Ok(form)
}

/// File name for `Content-Disposition`, reduced to a safe base name.
pub fn attachment_name(uploaded: Option<&str>, fallback: &str) -> String {
    let base = uploaded
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();

    if cleaned.trim().is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name_strips_paths() {
        assert_eq!(attachment_name(Some("/tmp/x/report.pdf"), "d.pdf"), "report.pdf");
        assert_eq!(attachment_name(Some("C:\\docs\\a.pdf"), "d.pdf"), "a.pdf");
    }

    #[test]
    fn test_attachment_name_drops_quotes_and_controls() {
        assert_eq!(attachment_name(Some("a\"b\r\n.pdf"), "d.pdf"), "ab.pdf");
    }

    #[test]
    fn test_attachment_name_fallback() {
        assert_eq!(attachment_name(None, "d.pdf"), "d.pdf");
        assert_eq!(attachment_name(Some("  "), "d.pdf"), "d.pdf");
        assert_eq!(attachment_name(Some("dir/"), "d.pdf"), "d.pdf");
    }

    #[test]
    fn test_rejection_messages_name_the_type() {
        let err = UploadKind::Image.rejection(Some("image/gif"));
        assert_eq!(err.to_string(), "Unsupported image type: image/gif");

        let err = UploadKind::Pdf.rejection(None);
        assert!(err.to_string().contains("PDF file format only"));
    }
}
