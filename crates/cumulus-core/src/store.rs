//! Boundary to the remote object store, plus a directory-backed
//! implementation used by the CLI and tests.
//!
//! Errors crossing this boundary are opaque transport faults; callers
//! propagate them as job-abort causes without interpreting codes.

use eyre::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Single-object operations the transfer worker consumes. Implementations
/// may retry internally; this layer never does.
pub trait ObjectStore: Send + Sync {
    /// Store `len` bytes of `data` under `name`. When `md5_hex` is supplied
    /// the store verifies it against the received bytes.
    fn put_object(
        &self,
        container: Option<&str>,
        name: &str,
        data: &mut dyn Read,
        len: u64,
        content_type: &str,
        md5_hex: Option<&str>,
    ) -> Result<()>;

    /// Write the zero-byte manifest object marking `segments_prefix` as the
    /// shared prefix of one logical object's segments.
    fn put_manifest(&self, container: Option<&str>, name: &str, segments_prefix: &str)
        -> Result<()>;

    /// Idempotent create-if-absent.
    fn create_container_if_absent(&self, name: &str) -> Result<()>;
}

/// Manifest marker payload persisted by [`DirectoryStore`].
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestMarker {
    pub segments_prefix: String,
}

/// Object store backed by a local directory tree: containers are
/// subdirectories, objects are files, manifests are `.manifest` JSON
/// markers beside the object name.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn resolve(&self, container: Option<&str>, name: &str) -> Result<PathBuf> {
        reject_escaping_name(name)?;
        let mut path = self.base.clone();
        if let Some(container) = container {
            reject_escaping_name(container)?;
            path.push(container);
        }
        path.push(name);
        Ok(path)
    }

    /// Path where an object named `name` would land. Exposed for callers
    /// that inspect results (tests, the CLI summary).
    pub fn object_path(&self, container: Option<&str>, name: &str) -> Result<PathBuf> {
        self.resolve(container, name)
    }
}

fn reject_escaping_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    if path.is_absolute() {
        bail!("refusing absolute object name: {name}");
    }
    for comp in path.components() {
        if matches!(comp, Component::ParentDir) {
            bail!("refusing object name with parent components: {name}");
        }
    }
    Ok(())
}

impl ObjectStore for DirectoryStore {
    fn put_object(
        &self,
        container: Option<&str>,
        name: &str,
        data: &mut dyn Read,
        len: u64,
        _content_type: &str,
        md5_hex: Option<&str>,
    ) -> Result<()> {
        let path = self.resolve(container, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create object parent {}", parent.display()))?;
        }

        let mut file =
            fs::File::create(&path).with_context(|| format!("create {}", path.display()))?;
        let (written, digest) = crate::segment::copy_and_digest(data, &mut file, len)?;

        if written != len {
            bail!("short object body for {name}: expected {len} bytes, got {written}");
        }
        if let Some(expected) = md5_hex {
            if digest != expected {
                bail!("checksum mismatch for {name}: expected {expected}, got {digest}");
            }
        }
        Ok(())
    }

    fn put_manifest(
        &self,
        container: Option<&str>,
        name: &str,
        segments_prefix: &str,
    ) -> Result<()> {
        let path = self.resolve(container, &format!("{name}.manifest"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create manifest parent {}", parent.display()))?;
        }
        let marker = ManifestMarker {
            segments_prefix: segments_prefix.to_string(),
        };
        let body = serde_json::to_vec(&marker).context("encode manifest marker")?;
        fs::write(&path, body).with_context(|| format!("write manifest {}", path.display()))?;
        Ok(())
    }

    fn create_container_if_absent(&self, name: &str) -> Result<()> {
        reject_escaping_name(name)?;
        fs::create_dir_all(self.base.join(name))
            .with_context(|| format!("create container {name}"))?;
        Ok(())
    }
}
