//! HTTP handlers for DOCX graph extraction. Stateless: the document is
//! scanned in-request and never stored.

use crate::{
    errors::AppError,
    handlers::report_handlers::attachment_response,
    services::graph_service::{self, GraphScan},
};
use axum::{Json, extract::Multipart, response::Response};
use bytes::Bytes;

/// POST `/api/graphs/inspect` — multipart DOCX (field `file`), returns the
/// scan manifest: accepted graphs with dimensions plus skipped entries.
pub async fn inspect_docx(multipart: Multipart) -> Result<Json<GraphScan>, AppError> {
    let (_, bytes) = docx_field(multipart).await?;
    let scan = graph_service::scan_docx(&bytes)?;
    tracing::info!(
        "docx scan: {} graphs, {} skipped",
        scan.graphs.len(),
        scan.skipped.len()
    );
    Ok(Json(scan))
}

/// POST `/api/graphs/extract` — multipart DOCX, returns the accepted
/// graphs bundled as a ZIP download.
pub async fn extract_docx(multipart: Multipart) -> Result<Response, AppError> {
    let (filename, bytes) = docx_field(multipart).await?;
    let scan = graph_service::scan_docx(&bytes)?;
    if scan.graphs.is_empty() {
        return Err(AppError::unprocessable(
            "no graphs found in the document; it may not contain charts or the images \
             do not meet the detection criteria",
        ));
    }

    let bundle = graph_service::bundle_zip(&scan.graphs)?;
    let stem = filename.strip_suffix(".docx").unwrap_or(&filename);
    Ok(attachment_response(
        bundle,
        "application/zip",
        format!("{}_graphs.zip", stem),
    ))
}

/// Pull the `file` field out of the multipart body and require a .docx
/// filename.
async fn docx_field(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart payload: {}", err)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request("file field carries no filename"))?;
        if !filename.to_ascii_lowercase().ends_with(".docx") {
            return Err(AppError::bad_request("only DOCX documents are accepted"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read upload: {}", err)))?;
        return Ok((filename, bytes));
    }

    Err(AppError::bad_request("multipart field `file` missing"))
}
