pub mod enumeration;
pub mod errors;
pub mod filter;
pub mod naming;
pub mod orchestrator;
pub mod registry;
pub mod segment;
pub mod store;
pub(crate) mod worker;

/// Largest object the store accepts in a single PUT. Files at or above this
/// size are split into numbered segments plus a manifest.
pub const DEFAULT_SEGMENT_CEILING: u64 = 5 * 1024 * 1024 * 1024 - 1;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Shared knobs for upload operations.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Per-object size ceiling; anything at or above it is segmented.
    pub segment_ceiling: u64,
    /// Content type sent when the caller does not supply one.
    pub content_type: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            segment_ceiling: DEFAULT_SEGMENT_CEILING,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}
