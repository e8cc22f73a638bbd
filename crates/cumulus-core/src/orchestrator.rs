//! Public facade for folder and single-file uploads.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::enumeration::FileWalker;
use crate::errors::{UploadError, UploadResult};
use crate::filter::{IgnoreFilter, IgnoreSpec};
use crate::registry::UploadRegistry;
use crate::store::ObjectStore;
use crate::worker::{upload_local_file, TransferWorker};
use crate::UploadConfig;

/// Handle returned by [`UploadOrchestrator::start_folder_upload`]: the job
/// key to poll or cancel with, and the byte total computed up front.
#[derive(Debug, Clone)]
pub struct StartedUpload {
    pub key: String,
    pub total_bytes: u64,
}

/// A single object created in the store.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub container: Option<String>,
    pub name: String,
    pub bytes: u64,
    /// Number of segment objects written; 1 for unsplit files.
    pub segments: u64,
    /// True when a manifest accompanies the segments.
    pub split: bool,
}

/// Input to the single-file upload: a path on disk, or an already-open
/// stream with an explicit name. Streams are spooled to a temp file first
/// so oversized inputs segment the same way paths do.
pub enum UploadSource {
    LocalPath(PathBuf),
    Stream {
        reader: Box<dyn Read + Send>,
        name: String,
    },
}

/// Validates inputs, registers jobs, and hands the actual transfer to a
/// background worker. Cheap to clone per call site; all orchestrators share
/// the process-wide registry.
pub struct UploadOrchestrator {
    store: Arc<dyn ObjectStore>,
    config: UploadConfig,
}

impl UploadOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(store, UploadConfig::default())
    }

    pub fn with_config(store: Arc<dyn ObjectStore>, config: UploadConfig) -> Self {
        Self { store, config }
    }

    /// Upload the directory tree at `root` into the store as a background
    /// job. Returns as soon as the byte total is computed and the job is
    /// registered; poll [`get_uploaded`](Self::get_uploaded) for progress.
    pub fn start_folder_upload(
        &self,
        root: &Path,
        container: Option<&str>,
        ignore: impl Into<IgnoreSpec>,
    ) -> UploadResult<StartedUpload> {
        if !root.is_dir() {
            return Err(UploadError::FolderNotFound(root.to_path_buf()));
        }

        let filter = IgnoreFilter::new(ignore);
        let walker = FileWalker::new(filter.clone());
        let total_bytes: u64 = walker
            .collect(root)
            .map_err(|err| UploadError::failed(root.display().to_string(), format!("{err:#}")))?
            .iter()
            .map(|entry| entry.size)
            .sum();

        let registry = UploadRegistry::global();
        let key = registry.create(total_bytes);

        let worker = TransferWorker {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            root: root.to_path_buf(),
            container: container.map(str::to_string),
            filter,
            job_key: key.clone(),
        };
        if let Err(err) = worker.spawn() {
            registry.record_failure(&key, format!("{err:#}"));
            registry.mark_finished(&key);
            return Err(UploadError::failed(
                root.display().to_string(),
                format!("{err:#}"),
            ));
        }

        Ok(StartedUpload { key, total_bytes })
    }

    /// Bytes transferred so far by the job identified by `key`.
    pub fn get_uploaded(&self, key: &str) -> UploadResult<u64> {
        UploadRegistry::global().progress(key)
    }

    /// Request cancellation of a folder upload. Cooperative: the file in
    /// flight finishes, no new file starts. No-op when the job already
    /// finished or was already cancelled.
    pub fn cancel_folder_upload(&self, key: &str) -> UploadResult<()> {
        UploadRegistry::global().cancel(key)
    }

    /// True once the job's worker has exited.
    pub fn upload_finished(&self, key: &str) -> UploadResult<bool> {
        UploadRegistry::global().is_finished(key)
    }

    /// Abort cause of a failed job, if any.
    pub fn upload_failure(&self, key: &str) -> UploadResult<Option<String>> {
        UploadRegistry::global().failure(key)
    }

    /// Upload one file (or open stream) synchronously, segmenting oversized
    /// inputs exactly like the folder path does.
    pub fn upload_file(
        &self,
        container: Option<&str>,
        source: UploadSource,
        object_name: Option<&str>,
        content_type: Option<&str>,
    ) -> UploadResult<RemoteObject> {
        let content_type = content_type.unwrap_or(&self.config.content_type);

        // Spooled stream sources must outlive the upload below.
        let _spool;
        let (path, default_name): (PathBuf, String) = match source {
            UploadSource::LocalPath(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        UploadError::failed(
                            path.display().to_string(),
                            "path has no file name",
                        )
                    })?;
                (path, name)
            }
            UploadSource::Stream { mut reader, name } => {
                let mut spool = tempfile::NamedTempFile::new()
                    .map_err(|err| UploadError::failed(name.as_str(), err))?;
                std::io::copy(&mut reader, spool.as_file_mut())
                    .map_err(|err| UploadError::failed(name.as_str(), err))?;
                let path = spool.path().to_path_buf();
                _spool = spool;
                (path, name)
            }
        };

        let object = object_name.unwrap_or(&default_name).to_string();
        let uploaded = upload_local_file(
            self.store.as_ref(),
            &self.config,
            container,
            &path,
            &object,
            content_type,
        )
        .map_err(|err| UploadError::failed(object.as_str(), format!("{err:#}")))?;

        Ok(RemoteObject {
            container: container.map(str::to_string),
            name: object,
            bytes: uploaded.bytes,
            segments: uploaded.segments,
            split: uploaded.split,
        })
    }
}
