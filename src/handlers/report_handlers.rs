//! HTTP handlers for report upload, inspection and export.
//! Streams payloads to avoid buffering where possible and delegates
//! storage concerns to `ReportStore`; extraction and analysis are pure
//! passes over the stored PDF text.

use crate::{
    errors::AppError,
    models::{
        event::{EventStats, PowerEvent},
        report::{Report, ReportKind},
        summary::{DailyCompliance, ReportIdentity, ReportInfo, ScheduleRow},
    },
    services::{
        analysis_service::{self, SplitTables, Violation},
        export_service, extract_service,
        report_service::ReportStore,
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

const PDF_MIME: &str = "application/pdf";
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// POST `/api/reports` — multipart upload of one PDF report (field `file`).
pub async fn upload_report(
    State(store): State<ReportStore>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
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
        if !filename.to_ascii_lowercase().ends_with(".pdf") {
            return Err(AppError::bad_request("only PDF reports are accepted"));
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| Some(PDF_MIME.to_string()));

        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read upload: {}", err)))?;
        let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(bytes)];

        let report = store
            .upload_stream(&filename, content_type, stream::iter(chunks))
            .await?;
        tracing::info!("stored report `{}` ({} bytes)", report.filename, report.size_bytes);
        return Ok((StatusCode::CREATED, Json(report)));
    }

    Err(AppError::bad_request("multipart field `file` missing"))
}

/// GET `/api/reports` — list stored reports.
pub async fn list_reports(
    State(store): State<ReportStore>,
) -> Result<Json<Vec<Report>>, AppError> {
    Ok(Json(store.list().await?))
}

/// GET `/api/reports/{id}` — metadata only.
pub async fn get_report(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(store.fetch(id).await?))
}

/// GET `/api/reports/{id}/file` — stream the original PDF back.
pub async fn download_report(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (report, file) = store.reader(id).await?;
    let stream = ReaderStream::new(file);

    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    let content_type = report.content_type.as_deref().unwrap_or(PDF_MIME);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&report.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    if let Some(etag) = report.etag.as_ref() {
        if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", etag)) {
            headers.insert(header::ETAG, value);
        }
    }
    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&report.uploaded_at.to_rfc2822())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    Ok(response)
}

/// DELETE `/api/reports/{id}` — soft-delete a report.
pub async fn delete_report(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The weekly digest: header metadata, schedule, daily compliance and
/// events in one response.
#[derive(Serialize)]
pub struct WeeklySummary {
    pub report: Report,
    pub info: ReportInfo,
    pub identity: ReportIdentity,
    /// `null` when the report period could not be parsed.
    pub schedule: Option<Vec<ScheduleRow>>,
    pub voltage_thd_daily: Vec<DailyCompliance>,
    pub current_tdd_daily: Vec<DailyCompliance>,
    pub events: Vec<PowerEvent>,
    pub event_stats: EventStats,
}

/// GET `/api/reports/{id}/summary` — weekly reports only.
pub async fn report_summary(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<WeeklySummary>, AppError> {
    let (report, pages) = load_pages(&store, id).await?;
    if report.kind != ReportKind::Weekly {
        return Err(AppError::unprocessable(
            "not a 7-day summary report; daily reports carry no summary section",
        ));
    }

    let info = extract_service::parse_report_info(&pages[0]);
    let identity = extract_service::parse_identity(&report.filename, &pages[0]);
    let schedule = analysis_service::schedule_table(&info).ok();
    let (voltage_daily, current_daily) = extract_service::extract_daily_distortion(&pages);
    let events = extract_service::extract_events(&pages);
    let event_stats = analysis_service::event_stats(&events);

    Ok(Json(WeeklySummary {
        report,
        info,
        identity,
        schedule,
        voltage_thd_daily: analysis_service::daily_compliance(
            &voltage_daily,
            analysis_service::VOLTAGE_THD_DAILY_LIMIT,
        ),
        current_tdd_daily: analysis_service::daily_compliance(
            &current_daily,
            analysis_service::CURRENT_TDD_DAILY_LIMIT,
        ),
        events,
        event_stats,
    }))
}

/// One harmonic table split for display: percentile and parity subsets
/// plus the harmonics the report failed to cover.
#[derive(Serialize)]
pub struct TableView {
    pub table: String,
    pub abbrev: String,
    pub split: SplitTables,
    pub missing_odd: Vec<u32>,
    pub missing_even: Vec<u32>,
}

/// GET `/api/reports/{id}/tables` — extracted harmonic tables.
pub async fn report_tables(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TableView>>, AppError> {
    let (_, pages) = load_pages(&store, id).await?;
    let tables = extract_service::extract_harmonic_tables(&pages);

    let mut views = Vec::new();
    for (kind, rows) in &tables {
        let cleaned = analysis_service::clean_rows(rows.clone());
        if cleaned.is_empty() {
            continue;
        }
        views.push(TableView {
            table: kind.title().to_string(),
            abbrev: kind.abbrev().to_string(),
            split: analysis_service::split_rows(&cleaned),
            missing_odd: analysis_service::missing_harmonics(&cleaned, true),
            missing_even: analysis_service::missing_harmonics(&cleaned, false),
        });
    }
    Ok(Json(views))
}

/// GET `/api/reports/{id}/violations` — harmonic limit exceedances.
pub async fn report_violations(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Violation>>, AppError> {
    Ok(Json(violations_for(&store, id).await?))
}

/// GET `/api/reports/{id}/violations.csv` — same data as CSV download.
pub async fn report_violations_csv(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let report = store.fetch(id).await?;
    let violations = violations_for(&store, id).await?;
    let bytes = export_service::violations_csv(&violations)?;
    Ok(attachment_response(
        bytes,
        "text/csv",
        format!("{}_violations.csv", file_stem(&report.filename)),
    ))
}

/// GET `/api/reports/{id}/tables.xlsx` — per-report workbook download.
pub async fn report_tables_xlsx(
    State(store): State<ReportStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let (report, pages) = load_pages(&store, id).await?;
    let tables = extract_service::extract_harmonic_tables(&pages);
    let bytes = export_service::report_workbook(&tables)?;
    Ok(attachment_response(
        bytes,
        XLSX_MIME,
        format!("{}_tables.xlsx", file_stem(&report.filename)),
    ))
}

/// GET `/api/exports/tables.xlsx` — one workbook over every stored report.
///
/// Reports whose text cannot be extracted are skipped with a warning
/// rather than failing the whole export.
pub async fn bulk_tables_xlsx(State(store): State<ReportStore>) -> Result<Response, AppError> {
    let reports = store.list().await?;

    let mut files = Vec::new();
    for report in reports {
        let (_, bytes) = store.read_bytes(report.id).await?;
        match extract_service::pages_from_pdf(&bytes) {
            Ok(pages) => {
                let tables = extract_service::extract_harmonic_tables(&pages);
                if !tables.is_empty() {
                    files.push((report.filename.clone(), tables));
                }
            }
            Err(err) => {
                tracing::warn!("skipping `{}` in bulk export: {}", report.filename, err);
            }
        }
    }

    let bytes = export_service::bulk_workbook(&files)?;
    Ok(attachment_response(
        bytes,
        XLSX_MIME,
        "bulk_harmonic_reports.xlsx".to_string(),
    ))
}

async fn load_pages(store: &ReportStore, id: Uuid) -> Result<(Report, Vec<String>), AppError> {
    let (report, bytes) = store.read_bytes(id).await?;
    let pages = extract_service::pages_from_pdf(&bytes)?;
    Ok((report, pages))
}

async fn violations_for(store: &ReportStore, id: Uuid) -> Result<Vec<Violation>, AppError> {
    let (_, pages) = load_pages(store, id).await?;
    let tables = extract_service::extract_harmonic_tables(&pages);
    let cleaned = tables
        .into_iter()
        .map(|(kind, rows)| (kind, analysis_service::clean_rows(rows)))
        .collect();
    Ok(analysis_service::collect_violations(&cleaned))
}

fn file_stem(filename: &str) -> &str {
    filename.strip_suffix(".pdf").unwrap_or(filename)
}

/// Build a download response with attachment disposition.
pub(crate) fn attachment_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    filename: String,
) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&length.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    // quotes stripped from the filename so the header always parses
    let safe_name: String = filename.chars().filter(|c| *c != '"').collect();
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}
