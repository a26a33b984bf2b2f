//! Defines routes for the harmonic analysis toolkit.
//!
//! ## Structure
//! - **UI & health**
//!   - `GET  /` — toolkit index page
//!   - `GET  /healthz`, `GET /readyz`
//!
//! - **Report endpoints**
//!   - `POST   /api/reports` — upload a PDF report (multipart, field `file`)
//!   - `GET    /api/reports` — list stored reports
//!   - `GET    /api/reports/{id}` — metadata
//!   - `GET    /api/reports/{id}/file` — download the original PDF
//!   - `DELETE /api/reports/{id}` — soft-delete
//!   - `GET    /api/reports/{id}/summary` — weekly digest
//!   - `GET    /api/reports/{id}/tables` — harmonic tables (JSON)
//!   - `GET    /api/reports/{id}/violations` — limit exceedances (JSON)
//!   - `GET    /api/reports/{id}/violations.csv` — CSV download
//!   - `GET    /api/reports/{id}/tables.xlsx` — workbook download
//!   - `GET    /api/exports/tables.xlsx` — bulk workbook over all reports
//!
//! - **Graph endpoints**
//!   - `POST /api/graphs/inspect` — DOCX scan manifest
//!   - `POST /api/graphs/extract` — DOCX charts as a ZIP

use crate::{
    handlers::{
        graph_handlers::{extract_docx, inspect_docx},
        health_handlers::{healthz, readyz},
        report_handlers::{
            bulk_tables_xlsx, delete_report, download_report, get_report, list_reports,
            report_summary, report_tables, report_tables_xlsx, report_violations,
            report_violations_csv, upload_report,
        },
        ui_handlers::index,
    },
    services::report_service::ReportStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Uploads are whole PDF/DOCX reports; the axum default (2 MiB) is too
/// small for scanned meter exports.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build and return the router for all toolkit routes.
///
/// The router carries shared state (`ReportStore`) to all handlers; the
/// extraction and graph pipelines are stateless.
pub fn routes() -> Router<ReportStore> {
    Router::new()
        // UI + health endpoints (mounted at root)
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Report endpoints
        .route("/api/reports", post(upload_report).get(list_reports))
        .route("/api/reports/{id}", get(get_report).delete(delete_report))
        .route("/api/reports/{id}/file", get(download_report))
        .route("/api/reports/{id}/summary", get(report_summary))
        .route("/api/reports/{id}/tables", get(report_tables))
        .route("/api/reports/{id}/violations", get(report_violations))
        .route("/api/reports/{id}/violations.csv", get(report_violations_csv))
        .route("/api/reports/{id}/tables.xlsx", get(report_tables_xlsx))
        .route("/api/exports/tables.xlsx", get(bulk_tables_xlsx))
        // Graph endpoints
        .route("/api/graphs/inspect", post(inspect_docx))
        .route("/api/graphs/extract", post(extract_docx))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
