//! API handlers for the pdfops server
//!
//! Provides REST endpoints for:
//! - PDF unlocking (`/decryptPdf`)
//! - PDF stream recompression (`/compressPdf`)
//! - Image to PDF assembly (`/imagesToPdf`)

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use pdfops_core::{
    compress_document, decrypt_document, images_to_document, media, ColorMode, CompressOptions,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::staging::{run_blocking, StagedArtifact};
use crate::upload::{attachment_name, read_form, FormSpec};
use crate::AppState;

const USAGE: &str = "\
pdfops: unlock, compress and assemble PDF files.

POST /decryptPdf   Remove password protection from a PDF.
                   Form parts: file (application/pdf), password (text,
                   user or owner password; may be empty).
POST /compressPdf  Recompress the streams of a PDF to reduce its size.
                   Form parts: file (application/pdf).
POST /imagesToPdf  Build one PDF with a page per uploaded image, in order.
                   Form parts: files (one or more of image/jpeg, image/png,
                   image/webp, image/tiff, image/bmp), image_mode (optional:
                   1, L, LA, RGB, RGBA or CMYK; default RGB).
GET  /health       Service status.
";

/// Handler: GET /
pub async fn handle_usage() -> &'static str {
    USAGE
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "pdfops-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: POST /decryptPdf
pub async fn handle_decrypt_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = read_form(multipart, &FormSpec::SINGLE_PDF).await?;
    let file = form.take_file(&FormSpec::SINGLE_PDF)?;
    let password = form
        .text("password")
        .ok_or_else(|| ApiError::MissingInput("Missing required field 'password'".to_string()))?
        .to_string();
    let download_name = attachment_name(file.file_name.as_deref(), "decrypted.pdf");

    info!(
        file = %download_name,
        content_type = ?file.content_type,
        size = file.bytes.len(),
        "Decrypt request"
    );

    let scratch = state.scratch.clone();
    let artifact = run_blocking(state.timeout_ms, move || {
        let mut doc = decrypt_document(&file.bytes, &password)?;
        scratch.stage(&mut doc)
    })
    .await?;

    pdf_response(artifact, &download_name)
}

/// Handler: POST /compressPdf
pub async fn handle_compress_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut form = read_form(multipart, &FormSpec::SINGLE_PDF).await?;
    let file = form.take_file(&FormSpec::SINGLE_PDF)?;
    let download_name = attachment_name(file.file_name.as_deref(), "compressed.pdf");
    let input_len = file.bytes.len();

    info!(
        file = %download_name,
        content_type = ?file.content_type,
        size = input_len,
        "Compress request"
    );

    let scratch = state.scratch.clone();
    let artifact = run_blocking(state.timeout_ms, move || {
        let (mut doc, stats) = compress_document(&file.bytes, CompressOptions::default())?;
        debug!(
            recompressed = stats.recompressed,
            compressed = stats.compressed,
            "Compression pass finished"
        );
        scratch.stage(&mut doc)
    })
    .await?;

    info!(before = input_len, after = artifact.len(), "Compressed PDF");

    pdf_response(artifact, &download_name)
}

/// Handler: POST /imagesToPdf
pub async fn handle_images_to_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let form = read_form(multipart, &FormSpec::IMAGES).await?;
    if form.files.is_empty() {
        return Err(pdfops_core::PdfOpsError::NoImages.into());
    }
    let mode = ColorMode::from_optional(form.text("image_mode"))?;

    info!(images = form.files.len(), mode = %mode, "Images to PDF request");

    let images: Vec<_> = form.files.into_iter().map(|file| file.bytes).collect();
    let scratch = state.scratch.clone();
    let artifact = run_blocking(state.timeout_ms, move || {
        let mut doc = images_to_document(&images, mode)?;
        scratch.stage(&mut doc)
    })
    .await?;

    pdf_response(artifact, "images.pdf")
}

fn pdf_response(artifact: StagedArtifact, file_name: &str) -> Result<Response, ApiError> {
    let headers = [
        (header::CONTENT_TYPE, media::PDF_MEDIA_TYPE.to_string()),
        (header::CONTENT_LENGTH, artifact.len().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    let body = artifact.into_body()?;

    Ok((StatusCode::OK, headers, body).into_response())
}
