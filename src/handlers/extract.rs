use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, HeaderMap},
    response::Json,
};
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::current_request_id;
use crate::models::{ExtractResponse, ExtractedDocument, FileReport, PendingFile};
use crate::services::CancelSignal;

pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Extracts every `file` field of a multipart upload.
///
/// Reports come back in upload order; the accumulated document lists texts
/// in the order their extractions finished.
pub async fn extract_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = current_request_id();

    info!(request_id = %request_id, "Starting multipart extraction request");

    let files = read_pending_files(&mut multipart, state.config.max_files_per_request).await?;
    info!(request_id = %request_id, file_count = files.len(), "Files received");

    // dropped with this future if the client goes away
    let cancel = CancelSignal::new();
    let _guard = cancel.drop_guard();

    let policy = state.config.size_policy();
    let mut reports: Vec<Option<FileReport>> = files.iter().map(|_| None).collect();
    let mut in_flight = FuturesUnordered::new();

    for (index, file) in files.iter().enumerate() {
        if let Err(e) = policy.check(file) {
            warn!(
                request_id = %request_id,
                file_name = %file.name,
                file_size = file.size_bytes,
                max_size = policy.max_bytes(),
                "File size exceeds limit, skipping extraction"
            );
            reports[index] = Some(FileReport::rejected(file, &e));
            continue;
        }

        let extractor = &state.extractor;
        let cancel = &cancel;
        in_flight.push(async move { (index, extractor.extract_text(file, cancel).await) });
    }

    let mut document = ExtractedDocument::new();
    while let Some((index, result)) = in_flight.next().await {
        let file = &files[index];
        let report = match result {
            Ok(text) => {
                document.push(&file.name, text.as_str());
                FileReport::extracted(file, text)
            }
            Err(e) => FileReport::failed(file, &e),
        };
        reports[index] = Some(report);
    }
    drop(in_flight);

    if document.is_empty() {
        warn!(request_id = %request_id, "No file in the request produced text");
    }

    let reports: Vec<FileReport> = reports.into_iter().flatten().collect();
    let total_time = start.elapsed().as_millis() as u64;

    info!(
        request_id = %request_id,
        extracted = document.len(),
        not_extracted = reports.len() - document.len(),
        submittable = document.is_submittable(),
        total_time_ms = total_time,
        "Request completed"
    );

    Ok(Json(ExtractResponse::new(reports, &document, total_time)))
}

async fn read_pending_files(multipart: &mut Multipart, max_files: usize) -> AppResult<Vec<PendingFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            debug!(field = ?field.name(), "Ignoring non-file multipart field");
            continue;
        }

        if files.len() == max_files {
            return Err(AppError::TooManyFiles {
                count: files.len() + 1,
                limit: max_files,
            });
        }

        let file_name = field
            .file_name()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::invalid_upload("file field is missing a file name"))?;
        let content_type = field.content_type().map(|ct| ct.to_string());

        let data = field.bytes().await?;

        let mut file = PendingFile::from_bytes(file_name, data);
        if let Some(mime_type) = content_type {
            file = file.with_mime_type(mime_type);
        }

        debug!(
            "Received file: {} ({} bytes, type: {:?})",
            file.name, file.size_bytes, file.mime_type
        );
        files.push(file);
    }

    if files.is_empty() {
        return Err(AppError::MissingFile);
    }
    Ok(files)
}

/// Extracts a single raw request body named by the `X-File-Name` header.
///
/// Unlike the multipart endpoint a failed extraction is an error response.
pub async fn extract_binary_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ExtractResponse>> {
    let start = Instant::now();
    let request_id = current_request_id();

    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("X-File-Name header is required"))?
        .to_string();

    info!(request_id = %request_id, file_name = %file_name, "Starting binary extraction request");

    if body.is_empty() {
        warn!(request_id = %request_id, "Empty body received");
        return Err(AppError::MissingFile);
    }

    let mut file = PendingFile::from_bytes(file_name, body);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        file = file.with_mime_type(content_type);
    }

    state.config.size_policy().check(&file)?;

    let cancel = CancelSignal::new();
    let _guard = cancel.drop_guard();
    let text = state.extractor.extract_text(&file, &cancel).await?;

    let mut document = ExtractedDocument::new();
    document.push(&file.name, text.as_str());

    let total_time = start.elapsed().as_millis() as u64;
    info!(
        request_id = %request_id,
        text_length = text.len(),
        total_time_ms = total_time,
        "Binary request completed successfully"
    );

    Ok(Json(ExtractResponse::new(
        vec![FileReport::extracted(&file, text)],
        &document,
        total_time,
    )))
}
