//! src/services/report_service.rs
//!
//! ReportStore — durable storage for uploaded PQ report PDFs backed by
//! SQLite for metadata and local disk for payloads. Payloads live beneath
//! `base_path/{shard}/{shard}/{filename}` so a big report folder never
//! piles thousands of files into one directory.

use crate::models::report::{Report, ReportKind};
use crate::services::extract_service;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use sqlx::SqlitePool;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report `{0}` not found")]
    ReportNotFound(Uuid),
    #[error("filename `{name}` invalid: {reason}")]
    InvalidFilename { name: String, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// ReportStore provides the report lifecycle:
/// - Upload a report (streams bytes to disk, inserts metadata into SQLite)
/// - List / fetch metadata (query SQLite)
/// - Open a payload for streaming out, or read it whole for extraction
/// - Delete a report (soft-delete in SQLite and attempt to remove the file)
///
/// Re-uploading the same filename overwrites: operators iterate on meter
/// exports and the newest file is the one that counts.
#[derive(Clone)]
pub struct ReportStore {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where report payloads are stored.
    pub base_path: PathBuf,
}

impl ReportStore {
    /// Create a new ReportStore backed by the provided SQLite pool and
    /// using `base_path` as the root directory for report payloads.
    pub fn new(db: Arc<SqlitePool>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            db,
            base_path: base_path.into(),
        }
    }

    /// Basic filename validation to avoid trivial path traversal vectors.
    ///
    /// Uploaded names become on-disk filenames, so anything that could
    /// escape the shard directory is rejected outright.
    fn ensure_filename_safe(&self, name: &str) -> StoreResult<()> {
        let reject = |reason: &str| {
            Err(StoreError::InvalidFilename {
                name: name.to_string(),
                reason: reason.to_string(),
            })
        };
        if name.is_empty() {
            return reject("must not be empty");
        }
        if name.len() > MAX_FILENAME_LEN {
            return reject("longer than 255 bytes");
        }
        if name.contains('/') || name.contains('\\') {
            return reject("must not contain path separators");
        }
        if name.contains("..") {
            return reject("must not contain `..`");
        }
        if name.bytes().any(|b| b.is_ascii_control() || b == b'\0') {
            return reject("must not contain control characters");
        }
        Ok(())
    }

    /// Weekly vs daily classification from the filename.
    pub fn classify(filename: &str) -> ReportKind {
        if extract_service::is_weekly_filename(filename) {
            ReportKind::Weekly
        } else {
            ReportKind::Daily
        }
    }

    /// Generate two-level shard identifiers for a report filename.
    ///
    /// Uses MD5(filename) and returns the first two bytes as lowercase
    /// hexadecimal strings (00-ff). Reduces file count per directory.
    fn payload_shards(filename: &str) -> (String, String) {
        let digest = md5::compute(filename);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Construct a fully-qualified payload path.
    ///
    /// Combines base_path/{shard}/{shard}/{filename}.
    /// Parent directories may not exist yet.
    fn payload_path(&self, filename: &str) -> PathBuf {
        let (shard_a, shard_b) = Self::payload_shards(filename);
        let mut path = self.base_path.clone();
        path.push(shard_a);
        path.push(shard_b);
        path.push(filename);
        path
    }

    /// Stream-upload a report to disk and upsert metadata.
    ///
    /// - Writes bytes incrementally to a temporary file.
    /// - Computes MD5/etag and size while streaming.
    /// - Atomically renames into the final location.
    /// - Upserts the metadata row; a re-uploaded filename keeps its id.
    ///
    /// Ensures durable writes (fsync) and cleans up temp files on errors.
    pub async fn upload_stream<S>(
        &self,
        filename: &str,
        content_type: Option<String>,
        stream: S,
    ) -> StoreResult<Report>
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        self.ensure_filename_safe(filename)?;

        let file_path = self.payload_path(filename);
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            StoreError::Io(io::Error::new(
                ErrorKind::Other,
                "payload path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: i64 = 0;
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(StoreError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StoreError::Io(err));
            }
        }

        let etag = format!("{:x}", digest.compute());
        let insert_result = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (
                id, filename, kind, content_type, size_bytes, etag, uploaded_at, is_deleted
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0)
            ON CONFLICT(filename) DO UPDATE SET
                kind = excluded.kind,
                content_type = excluded.content_type,
                size_bytes = excluded.size_bytes,
                etag = excluded.etag,
                uploaded_at = excluded.uploaded_at,
                is_deleted = 0
            RETURNING id, filename, kind, content_type, size_bytes, etag, uploaded_at, is_deleted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(filename)
        .bind(Self::classify(filename))
        .bind(content_type)
        .bind(size_bytes)
        .bind(&etag)
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(report) => Ok(report),
            Err(err) => {
                let _ = fs::remove_file(&file_path).await;
                Err(StoreError::Sqlx(err))
            }
        }
    }

    /// All non-deleted reports, newest upload first.
    pub async fn list(&self) -> StoreResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            "SELECT id, filename, kind, content_type, size_bytes, etag, uploaded_at, is_deleted
             FROM reports WHERE is_deleted = 0
             ORDER BY uploaded_at DESC, filename ASC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(reports)
    }

    /// Fetch a non-deleted report's metadata.
    pub async fn fetch(&self, id: Uuid) -> StoreResult<Report> {
        sqlx::query_as::<_, Report>(
            "SELECT id, filename, kind, content_type, size_bytes, etag, uploaded_at, is_deleted
             FROM reports WHERE id = ? AND is_deleted = 0",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => StoreError::ReportNotFound(id),
            other => StoreError::Sqlx(other),
        })
    }

    /// Fetch a report for streaming out.
    ///
    /// Returns metadata and an opened File handle. Returns ReportNotFound
    /// if metadata exists but the physical file is missing.
    pub async fn reader(&self, id: Uuid) -> StoreResult<(Report, File)> {
        let report = self.fetch(id).await?;
        let file_path = self.payload_path(&report.filename);
        let file = File::open(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::ReportNotFound(id)
            } else {
                StoreError::Io(err)
            }
        })?;
        Ok((report, file))
    }

    /// Read a whole payload into memory for extraction passes.
    pub async fn read_bytes(&self, id: Uuid) -> StoreResult<(Report, Vec<u8>)> {
        let report = self.fetch(id).await?;
        let file_path = self.payload_path(&report.filename);
        let bytes = fs::read(&file_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StoreError::ReportNotFound(id)
            } else {
                StoreError::Io(err)
            }
        })?;
        Ok((report, bytes))
    }

    /// Soft-delete a report and attempt to remove its payload.
    ///
    /// Idempotent: repeated calls return ReportNotFound once deleted.
    pub async fn delete(&self, id: Uuid) -> StoreResult<Report> {
        let report = self.fetch(id).await?;

        let result = sqlx::query("UPDATE reports SET is_deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ReportNotFound(id));
        }

        let file_path = self.payload_path(&report.filename);
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed payload {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("payload {} already missing", file_path.display());
            }
            Err(err) => return Err(StoreError::Io(err)),
        }

        if let Some(parent) = file_path.parent() {
            self.prune_empty_dirs(parent).await;
        }

        Ok(report)
    }

    /// Recursively remove empty shard directories up to the storage root.
    ///
    /// Stops when:
    /// - directory not empty
    /// - directory not found
    /// - reached the root
    /// - encountered unexpected I/O errors
    async fn prune_empty_dirs(&self, start: &Path) {
        let stop = self.base_path.as_path();
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> ReportStore {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for stmt in include_str!("../../migrations/0001_init.sql")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(stmt).execute(&db).await.unwrap();
        }
        let dir = std::env::temp_dir().join(format!("harmonic-toolkit-test-{}", Uuid::new_v4()));
        ReportStore::new(Arc::new(db), dir)
    }

    fn byte_stream(data: &'static [u8]) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        stream::iter([Ok(Bytes::from_static(data))])
    }

    #[tokio::test]
    async fn filenames_are_validated() {
        let store = ReportStore::new(
            Arc::new(SqlitePool::connect_lazy("sqlite::memory:").unwrap()),
            "/tmp/unused",
        );
        assert!(store.ensure_filename_safe("7 Days report.pdf").is_ok());
        assert!(store.ensure_filename_safe("").is_err());
        assert!(store.ensure_filename_safe("a/b.pdf").is_err());
        assert!(store.ensure_filename_safe("..secret.pdf").is_err());
        assert!(store.ensure_filename_safe("bad\u{0}name.pdf").is_err());
    }

    #[test]
    fn classification_follows_the_filename() {
        assert_eq!(
            ReportStore::classify("7 Days report (TATA Block-15).pdf"),
            ReportKind::Weekly
        );
        assert_eq!(
            ReportStore::classify("Day 3 Night (TATA Block-15).pdf"),
            ReportKind::Daily
        );
    }

    #[test]
    fn shards_are_deterministic() {
        let a = ReportStore::payload_shards("7 Days report.pdf");
        let b = ReportStore::payload_shards("7 Days report.pdf");
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 2);
        assert_eq!(a.1.len(), 2);
    }

    #[tokio::test]
    async fn upload_list_read_delete_cycle() {
        let store = test_store().await;

        let report = store
            .upload_stream(
                "7 Days report.pdf",
                Some("application/pdf".to_string()),
                byte_stream(b"%PDF-1.4 payload"),
            )
            .await
            .unwrap();
        assert_eq!(report.kind, ReportKind::Weekly);
        assert_eq!(report.size_bytes, 16);
        assert!(report.etag.is_some());

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].filename, "7 Days report.pdf");

        let (meta, bytes) = store.read_bytes(report.id).await.unwrap();
        assert_eq!(meta.id, report.id);
        assert_eq!(bytes, b"%PDF-1.4 payload");

        store.delete(report.id).await.unwrap();
        assert!(matches!(
            store.fetch(report.id).await,
            Err(StoreError::ReportNotFound(_))
        ));
        assert!(store.list().await.unwrap().is_empty());

        let _ = fs::remove_dir_all(&store.base_path).await;
    }

    #[tokio::test]
    async fn reupload_overwrites_and_keeps_the_id() {
        let store = test_store().await;

        let first = store
            .upload_stream("Day 1 Day.pdf", None, byte_stream(b"old bytes"))
            .await
            .unwrap();
        let second = store
            .upload_stream("Day 1 Day.pdf", None, byte_stream(b"new bytes!"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.size_bytes, 10);
        assert_ne!(first.etag, second.etag);

        let (_, bytes) = store.read_bytes(first.id).await.unwrap();
        assert_eq!(bytes, b"new bytes!");

        let _ = fs::remove_dir_all(&store.base_path).await;
    }
}
