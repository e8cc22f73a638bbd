//! Background transfer worker: walks an upload root and moves every
//! included file into the store, one file at a time.

use eyre::{bail, Context, Result};
use log::{debug, error};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::enumeration::{FileWalker, WalkControl};
use crate::filter::IgnoreFilter;
use crate::naming::{object_name, segments_prefix};
use crate::registry::UploadRegistry;
use crate::segment::{copy_and_digest, file_md5, SegmentPlan};
use crate::store::ObjectStore;
use crate::UploadConfig;

/// Outcome of one file's upload.
#[derive(Debug, Clone)]
pub(crate) struct UploadedFile {
    pub bytes: u64,
    pub segments: u64,
    pub split: bool,
}

pub(crate) struct TransferWorker {
    pub store: Arc<dyn ObjectStore>,
    pub config: UploadConfig,
    pub root: PathBuf,
    pub container: Option<String>,
    pub filter: IgnoreFilter,
    pub job_key: String,
}

impl TransferWorker {
    /// Start the worker on its own named thread. The caller is never
    /// blocked; job state flows through the global registry.
    pub(crate) fn spawn(self) -> Result<()> {
        let short = self.job_key.chars().take(8).collect::<String>();
        std::thread::Builder::new()
            .name(format!("cumulus-upload-{short}"))
            .spawn(move || self.run())
            .context("spawn transfer worker thread")?;
        Ok(())
    }

    fn run(self) {
        let registry = UploadRegistry::global();
        if let Err(err) = self.upload_tree(registry) {
            error!("upload job {} aborted: {err:#}", self.job_key);
            registry.record_failure(&self.job_key, format!("{err:#}"));
        }
        registry.mark_finished(&self.job_key);
    }

    fn upload_tree(&self, registry: &UploadRegistry) -> Result<()> {
        if let Some(container) = self.container.as_deref() {
            if !container.is_empty() {
                self.store
                    .create_container_if_absent(container)
                    .with_context(|| format!("create container {container}"))?;
            }
        }

        let walker = FileWalker::new(self.filter.clone());
        walker.walk(&self.root, |entry| {
            // Cancellation is honored at file boundaries only: a file in
            // flight always completes, including its manifest.
            if registry.should_abort(&self.job_key) {
                debug!("upload job {} cancelled", self.job_key);
                return Ok(WalkControl::Stop);
            }

            let object = object_name(&self.root, &entry.absolute_path);
            let uploaded = upload_local_file(
                self.store.as_ref(),
                &self.config,
                self.container.as_deref(),
                &entry.absolute_path,
                &object,
                &self.config.content_type,
            )?;
            debug!(
                "uploaded {object} ({} bytes, {} segment(s))",
                uploaded.bytes, uploaded.segments
            );

            // Progress is file-granular: whole-file increments that sum to
            // the job total on full success.
            registry.add_progress(&self.job_key, entry.size).ok();
            Ok(WalkControl::Continue)
        })
    }
}

/// Upload one local file as `object`, segmenting when it reaches the
/// configured ceiling. Shared by the worker and the standalone single-file
/// operation.
pub(crate) fn upload_local_file(
    store: &dyn ObjectStore,
    config: &UploadConfig,
    container: Option<&str>,
    path: &Path,
    object: &str,
    content_type: &str,
) -> Result<UploadedFile> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let plan = SegmentPlan::new(object, size, config.segment_ceiling);

    if !plan.split {
        let digest = file_md5(path)?;
        let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        store
            .put_object(container, object, &mut file, size, content_type, Some(&digest))
            .with_context(|| format!("put object {object}"))?;
        return Ok(UploadedFile {
            bytes: size,
            segments: 1,
            split: false,
        });
    }

    let mut source = File::open(path).with_context(|| format!("open {}", path.display()))?;
    for segment in &plan.segments {
        // Each segment is spooled into its own temp file so the store sees
        // a rewindable body of known length. The temp file is removed on
        // every exit path when it drops.
        let mut spool = NamedTempFile::new().context("create segment spool file")?;
        source.seek(SeekFrom::Start(segment.offset))?;
        let mut bounded = (&mut source).take(segment.len);
        let (copied, digest) = copy_and_digest(&mut bounded, spool.as_file_mut(), segment.len)?;
        if copied != segment.len {
            bail!(
                "{} changed while uploading: segment {} expected {} bytes, read {copied}",
                path.display(),
                segment.index,
                segment.len
            );
        }

        spool.as_file_mut().seek(SeekFrom::Start(0))?;
        let body: &mut dyn Read = spool.as_file_mut();
        store
            .put_object(
                container,
                &segment.name,
                body,
                segment.len,
                content_type,
                Some(&digest),
            )
            .with_context(|| format!("put segment {}", segment.name))?;
    }

    // The manifest goes up strictly after every segment succeeded; a failed
    // segment leaves the logical object absent rather than silently partial.
    store
        .put_manifest(container, object, &segments_prefix(object))
        .with_context(|| format!("put manifest {object}"))?;

    Ok(UploadedFile {
        bytes: size,
        segments: plan.segment_count(),
        split: true,
    })
}
