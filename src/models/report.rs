//! Represents an uploaded power-quality report file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Coarse report classification derived from the uploaded filename.
///
/// Weekly reports ("7 Days Report …") carry the summary tables the digest
/// endpoints work on; daily reports (Day 1-7, Day/Night) only contribute
/// harmonic tables.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Weekly,
    Daily,
}

/// A stored PQ meter report.
///
/// The row holds metadata only; the PDF payload lives on disk under the
/// storage root, addressed by the original filename.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Report {
    /// Unique identifier for this report (UUID for internal DB use).
    pub id: Uuid,

    /// Original filename of the uploaded PDF.
    pub filename: String,

    /// Weekly summary or single-day report.
    pub kind: ReportKind,

    /// Content type (MIME type) supplied at upload.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// MD5 checksum of the payload for integrity verification.
    pub etag: Option<String>,

    /// When this report was (last) uploaded.
    pub uploaded_at: DateTime<Utc>,

    /// Whether the report is marked as deleted (soft delete).
    pub is_deleted: bool,
}
