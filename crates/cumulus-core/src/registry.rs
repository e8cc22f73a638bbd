//! Process-wide table of folder-upload jobs.
//!
//! The registry is the only mutable state shared between a transfer worker
//! and its caller. Entries are created at job start and persist until
//! process exit; there is no eviction.

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::Relaxed};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{UploadError, UploadResult};

#[derive(Debug)]
struct JobRecord {
    total_bytes: u64,
    transferred: AtomicU64,
    keep_going: AtomicBool,
    finished: AtomicBool,
    failure: Mutex<Option<String>>,
}

/// Table mapping opaque job keys to job state. All operations are safe
/// under concurrent access from the worker thread and caller threads.
#[derive(Debug, Default)]
pub struct UploadRegistry {
    jobs: RwLock<HashMap<String, Arc<JobRecord>>>,
}

static GLOBAL: Lazy<UploadRegistry> = Lazy::new(UploadRegistry::default);

impl UploadRegistry {
    /// The process-wide registry shared by all orchestrators.
    pub fn global() -> &'static UploadRegistry {
        &GLOBAL
    }

    /// Register a fresh job and return its key.
    pub fn create(&self, total_bytes: u64) -> String {
        let key = Uuid::new_v4().to_string();
        let record = Arc::new(JobRecord {
            total_bytes,
            transferred: AtomicU64::new(0),
            keep_going: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            failure: Mutex::new(None),
        });
        self.jobs.write().insert(key.clone(), record);
        key
    }

    fn record(&self, key: &str) -> UploadResult<Arc<JobRecord>> {
        self.jobs
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| UploadError::InvalidUploadId(key.to_string()))
    }

    /// Add `n` bytes of completed-file progress to the job.
    pub fn add_progress(&self, key: &str, n: u64) -> UploadResult<()> {
        self.record(key)?.transferred.fetch_add(n, Relaxed);
        Ok(())
    }

    /// Bytes transferred so far, in whole-file increments.
    pub fn progress(&self, key: &str) -> UploadResult<u64> {
        Ok(self.record(key)?.transferred.load(Relaxed))
    }

    /// Total bytes the job set out to transfer.
    pub fn total_bytes(&self, key: &str) -> UploadResult<u64> {
        Ok(self.record(key)?.total_bytes)
    }

    /// Request cooperative cancellation. Idempotent; honored at the next
    /// file boundary.
    pub fn cancel(&self, key: &str) -> UploadResult<()> {
        self.record(key)?.keep_going.store(false, Relaxed);
        Ok(())
    }

    /// Worker-side poll before each file. An unknown key also aborts.
    pub fn should_abort(&self, key: &str) -> bool {
        match self.record(key) {
            Ok(record) => !record.keep_going.load(Relaxed),
            Err(_) => true,
        }
    }

    /// True once the worker has exited, whether by completion, abort, or
    /// cancellation.
    pub fn is_finished(&self, key: &str) -> UploadResult<bool> {
        Ok(self.record(key)?.finished.load(Relaxed))
    }

    /// The abort cause recorded by the worker, if the job failed.
    pub fn failure(&self, key: &str) -> UploadResult<Option<String>> {
        Ok(self.record(key)?.failure.lock().clone())
    }

    pub(crate) fn mark_finished(&self, key: &str) {
        if let Ok(record) = self.record(key) {
            record.finished.store(true, Relaxed);
        }
    }

    pub(crate) fn record_failure(&self, key: &str, message: String) {
        if let Ok(record) = self.record(key) {
            *record.failure.lock() = Some(message);
        }
    }
}
