/*!
 * Incremental sync of a local tree to a remote bucket
 *
 * A producer thread walks the tree and feeds a bounded channel; the
 * consumer fingerprints each file and uploads it only when its ETag
 * differs from the manifest. At most `workers` files are in flight, and the
 * cancellation token is checked before each new file is started.
 */

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::checksum::CHUNK_SIZE;
use super::etag::Fingerprint;
use super::manifest::Manifest;
use super::walker::{relative_key, FileEntry, TreeWalker};
use crate::config::{ErrorMode, SyncConfig};
use crate::error::{Result, WebinatorError};
use crate::protocol::{RemoteStore, UploadRequest};

/// Content type used when the key's extension is not recognized
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Why a file has to be uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadReason {
    /// Key absent from the manifest
    NotInManifest,

    /// Remote ETag differs from the local fingerprint
    FingerprintMismatch,

    /// Zero-length content has no comparable fingerprint
    EmptyContent,

    /// Remote ETag could not be parsed
    UnrecognizedRemoteEtag,
}

impl fmt::Display for UploadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadReason::NotInManifest => write!(f, "not in manifest"),
            UploadReason::FingerprintMismatch => write!(f, "fingerprint mismatch"),
            UploadReason::EmptyContent => write!(f, "empty file"),
            UploadReason::UnrecognizedRemoteEtag => write!(f, "unrecognized remote etag"),
        }
    }
}

/// Per-file decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Upload(UploadReason),
}

/// Compare a local fingerprint against the manifest entry for its key
///
/// `remote` is `None` when the key is absent from the manifest.
pub fn decide(local: &Fingerprint, remote: Option<&str>) -> Decision {
    if local.is_empty() {
        return Decision::Upload(UploadReason::EmptyContent);
    }

    let Some(etag) = remote else {
        return Decision::Upload(UploadReason::NotInManifest);
    };

    match Fingerprint::parse(etag) {
        Some(remote) if remote == *local => Decision::Skip,
        Some(_) => Decision::Upload(UploadReason::FingerprintMismatch),
        None => Decision::Upload(UploadReason::UnrecognizedRemoteEtag),
    }
}

/// Guess a content type from the key's extension
pub fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fingerprint matched; nothing written
    Skipped,

    /// Uploaded for the given reason
    Uploaded(UploadReason),

    /// Would have been uploaded (dry run)
    Planned(UploadReason),

    /// Hashing, walking or uploading failed
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Skipped => write!(f, "skipped, fingerprint match"),
            Outcome::Uploaded(reason) => write!(f, "uploaded, {}", reason),
            Outcome::Planned(reason) => write!(f, "would upload, {}", reason),
            Outcome::Failed(reason) => write!(f, "failed, {}", reason),
        }
    }
}

/// Report line for a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub key: String,
    pub outcome: Outcome,
}

impl FileReport {
    fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            outcome: Outcome::Failed(reason.into()),
        }
    }
}

/// Result of one sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Per-file results in completion order
    pub files: Vec<FileReport>,
    pub skipped: u64,
    pub uploaded: u64,
    pub planned: u64,
    pub failed: u64,

    /// Run stopped early on the cancellation token
    pub cancelled: bool,
    pub duration: Duration,
}

impl SyncReport {
    fn record(&mut self, file: FileReport) {
        match &file.outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Uploaded(_) => self.uploaded += 1,
            Outcome::Planned(_) => self.planned += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
        self.files.push(file);
    }

    /// Look up the report line for `key`
    pub fn file(&self, key: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.key == key)
    }

    /// Keys that were uploaded, sorted
    pub fn uploaded_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .files
            .iter()
            .filter(|f| matches!(f.outcome, Outcome::Uploaded(_)))
            .map(|f| f.key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    pub fn total(&self) -> u64 {
        self.skipped + self.uploaded + self.planned + self.failed
    }

    /// No file failed and the run was not cancelled
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} skipped, {} failed",
            self.uploaded, self.skipped, self.failed
        )?;
        if self.planned > 0 {
            write!(f, ", {} planned", self.planned)?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Drives walk → fingerprint → diff → upload for one store
pub struct Syncer<S: RemoteStore + ?Sized + 'static> {
    store: Arc<S>,
    config: SyncConfig,
}

impl<S: RemoteStore + ?Sized + 'static> Syncer<S> {
    pub fn new(store: Arc<S>, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Sync `root` into `bucket`
    pub async fn sync(&self, root: &Path, bucket: &str) -> Result<SyncReport> {
        self.sync_with_cancel(root, bucket, CancellationToken::new())
            .await
    }

    /// Sync `root` into `bucket`, stopping before the next file once `cancel` fires
    pub async fn sync_with_cancel(
        &self,
        root: &Path,
        bucket: &str,
        cancel: CancellationToken,
    ) -> Result<SyncReport> {
        let walker = TreeWalker::new(root, self.config.ignore_set()?)?;
        let manifest = Manifest::load(self.store.as_ref(), bucket).await?;
        self.sync_with_manifest(&walker, bucket, Arc::new(manifest), cancel)
            .await
    }

    /// Sync against an already loaded manifest
    pub async fn sync_with_manifest(
        &self,
        walker: &TreeWalker,
        bucket: &str,
        manifest: Arc<Manifest>,
        cancel: CancellationToken,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let workers = self.config.workers.max(1);
        info!(
            root = %walker.root().display(),
            bucket,
            workers,
            dry_run = self.config.dry_run,
            "sync started"
        );

        // Bounded channel keeps the walker from running far ahead of workers
        let (tx, mut rx) = mpsc::channel::<Result<FileEntry>>((workers * 4).clamp(16, 1000));
        let walk = walker.iter();
        let producer = tokio::task::spawn_blocking(move || {
            for item in walk {
                if tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        let mut tasks: JoinSet<FileReport> = JoinSet::new();
        let mut report = SyncReport::default();
        // First failure under fail-fast: (key, reason)
        let mut abort: Option<(String, String)> = None;

        'files: loop {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break 'files;
                }
                item = rx.recv() => item,
            };
            let Some(item) = item else { break };

            // Wait for a free worker slot
            while tasks.len() >= workers {
                let joined = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break 'files;
                    }
                    joined = tasks.join_next() => joined,
                };
                if let Some(joined) = joined {
                    self.absorb(joined, &mut report, &mut abort);
                }
            }
            while let Some(joined) = tasks.try_join_next() {
                self.absorb(joined, &mut report, &mut abort);
            }
            if abort.is_some() {
                break;
            }

            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    let key = failure_key(walker.root(), &e);
                    warn!(key = %key, error = %e, "walk failed");
                    let file = FileReport::failed(key, e.to_string());
                    self.absorb(Ok(file), &mut report, &mut abort);
                    if abort.is_some() {
                        break;
                    }
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let manifest = Arc::clone(&manifest);
            let bucket = bucket.to_string();
            let dry_run = self.config.dry_run;
            tasks.spawn(async move {
                let key = entry.key.clone();
                // Inner task so a panic is still reported under its key
                let worker = tokio::spawn(async move {
                    process_file(store.as_ref(), &bucket, &manifest, entry, dry_run).await
                });
                match worker.await {
                    Ok(file) => file,
                    Err(e) => {
                        warn!(key = %key, error = %e, "worker task failed");
                        FileReport::failed(key, format!("worker task failed: {}", e))
                    }
                }
            });
        }

        // Stop the walker, then let in-flight files finish
        drop(rx);
        while let Some(joined) = tasks.join_next().await {
            self.absorb(joined, &mut report, &mut abort);
        }
        if let Err(e) = producer.await {
            warn!(error = %e, "walker thread failed");
        }

        report.duration = start.elapsed();
        info!(
            uploaded = report.uploaded,
            skipped = report.skipped,
            failed = report.failed,
            planned = report.planned,
            cancelled = report.cancelled,
            duration_ms = report.duration.as_millis() as u64,
            "sync finished"
        );

        match abort {
            Some((key, reason)) => Err(WebinatorError::FileFailed {
                key,
                reason,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }

    fn absorb(
        &self,
        joined: std::result::Result<FileReport, tokio::task::JoinError>,
        report: &mut SyncReport,
        abort: &mut Option<(String, String)>,
    ) {
        let file = match joined {
            Ok(file) => file,
            Err(e) => FileReport::failed("<unknown>", format!("worker task failed: {}", e)),
        };

        if let Outcome::Failed(reason) = &file.outcome {
            if self.config.error_mode == ErrorMode::Abort && abort.is_none() {
                *abort = Some((file.key.clone(), reason.clone()));
            }
        }
        report.record(file);
    }
}

/// Fingerprint one file and upload it if the manifest disagrees
async fn process_file<S: RemoteStore + ?Sized>(
    store: &S,
    bucket: &str,
    manifest: &Manifest,
    entry: FileEntry,
    dry_run: bool,
) -> FileReport {
    let FileEntry { path, key } = entry;

    let hash_path = path.clone();
    let fingerprint =
        match tokio::task::spawn_blocking(move || Fingerprint::from_file(&hash_path)).await {
            Ok(Ok(fingerprint)) => fingerprint,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "failed to read file");
                return FileReport::failed(key, format!("read error: {}", e));
            }
            Err(e) => return FileReport::failed(key, format!("hash task failed: {}", e)),
        };
    debug!(key = %key, fingerprint = %fingerprint, parts = fingerprint.parts(), "fingerprinted");

    let reason = match decide(&fingerprint, manifest.get(&key)) {
        Decision::Skip => {
            info!(key = %key, "skipped, fingerprint match");
            return FileReport {
                key,
                outcome: Outcome::Skipped,
            };
        }
        Decision::Upload(reason) => reason,
    };

    let content_type = content_type_for(&key);
    if dry_run {
        info!(key = %key, reason = %reason, content_type = %content_type, "would upload");
        return FileReport {
            key,
            outcome: Outcome::Planned(reason),
        };
    }

    let request = UploadRequest {
        bucket: bucket.to_string(),
        key,
        local_path: path,
        content_type,
        chunk_size: CHUNK_SIZE,
    };

    match store.upload(&request).await {
        Ok(()) => {
            info!(
                key = %request.key,
                reason = %reason,
                content_type = %request.content_type,
                "uploaded"
            );
            FileReport {
                key: request.key,
                outcome: Outcome::Uploaded(reason),
            }
        }
        Err(e) => {
            warn!(key = %request.key, error = %e, "upload failed");
            FileReport::failed(request.key, e.to_string())
        }
    }
}

fn failure_key(root: &Path, err: &WebinatorError) -> String {
    match err {
        WebinatorError::Walk { path, .. } => {
            relative_key(root, path).unwrap_or_else(|| path.display().to_string())
        }
        other => other.to_string(),
    }
}
