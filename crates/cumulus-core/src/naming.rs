//! Mapping of local paths to remote object names.

use std::path::Path;

/// Remote object name for `path` relative to `root`: forward slashes on
/// every host, nested structure preserved in the flat namespace.
pub fn object_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Number of decimal digits needed to print `count`, used as the zero-pad
/// width for segment names so lexicographic and numeric order coincide.
pub fn digit_width(count: u64) -> usize {
    (count.max(1).ilog10() + 1) as usize
}

/// Name of segment `index` (1-based) of `object`, zero-padded to `width`.
pub fn segment_name(object: &str, index: u64, width: usize) -> String {
    format!("{object}.{index:0width$}")
}

/// Shared prefix of all segment names of `object`, recorded in the manifest.
pub fn segments_prefix(object: &str) -> String {
    format!("{object}.")
}
