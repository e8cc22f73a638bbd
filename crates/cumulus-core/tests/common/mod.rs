//! Shared test fixtures: an in-memory recording object store and tree
//! builders.

use eyre::{bail, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use cumulus_core::registry::UploadRegistry;
use cumulus_core::store::ObjectStore;

/// One call observed at the store boundary, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ContainerCreated(String),
    Object {
        container: Option<String>,
        name: String,
        len: u64,
        md5_hex: Option<String>,
    },
    Manifest {
        container: Option<String>,
        name: String,
        segments_prefix: String,
    },
}

/// Records every store call; optionally injects per-put latency or a
/// failure on a specific object name.
#[derive(Debug, Default)]
pub struct MockStore {
    pub events: Mutex<Vec<StoreEvent>>,
    pub put_latency: Option<Duration>,
    pub fail_on: Option<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            put_latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn object_names(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StoreEvent::Object { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }
}

impl ObjectStore for MockStore {
    fn put_object(
        &self,
        container: Option<&str>,
        name: &str,
        data: &mut dyn Read,
        len: u64,
        _content_type: &str,
        md5_hex: Option<&str>,
    ) -> Result<()> {
        if let Some(latency) = self.put_latency {
            std::thread::sleep(latency);
        }
        if self.fail_on.as_deref() == Some(name) {
            bail!("injected transport fault for {name}");
        }

        let mut body = Vec::new();
        data.read_to_end(&mut body)?;
        if body.len() as u64 != len {
            bail!("body length mismatch for {name}");
        }
        if let Some(expected) = md5_hex {
            let actual = format!("{:x}", md5::compute(&body));
            if actual != expected {
                bail!("checksum mismatch for {name}");
            }
        }

        self.events.lock().unwrap().push(StoreEvent::Object {
            container: container.map(str::to_string),
            name: name.to_string(),
            len,
            md5_hex: md5_hex.map(str::to_string),
        });
        Ok(())
    }

    fn put_manifest(
        &self,
        container: Option<&str>,
        name: &str,
        segments_prefix: &str,
    ) -> Result<()> {
        self.events.lock().unwrap().push(StoreEvent::Manifest {
            container: container.map(str::to_string),
            name: name.to_string(),
            segments_prefix: segments_prefix.to_string(),
        });
        Ok(())
    }

    fn create_container_if_absent(&self, name: &str) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(StoreEvent::ContainerCreated(name.to_string()));
        Ok(())
    }
}

pub fn write_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Poll the registry until the job's worker exits. Panics after `timeout`.
pub fn wait_for_finish(key: &str, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    let registry = UploadRegistry::global();
    while !registry.is_finished(key).unwrap() {
        assert!(
            Instant::now() < deadline,
            "upload job {key} did not finish within {timeout:?}"
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}
