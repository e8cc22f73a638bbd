//! End-to-end folder and single-file upload scenarios against the
//! recording mock store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{wait_for_finish, write_file, MockStore, StoreEvent};
use cumulus_core::errors::UploadError;
use cumulus_core::filter::IgnoreSpec;
use cumulus_core::orchestrator::{UploadOrchestrator, UploadSource};
use cumulus_core::store::ObjectStore;
use cumulus_core::UploadConfig;
use tempfile::TempDir;

fn orchestrator(store: Arc<MockStore>, ceiling: u64) -> UploadOrchestrator {
    UploadOrchestrator::with_config(
        store,
        UploadConfig {
            segment_ceiling: ceiling,
            ..UploadConfig::default()
        },
    )
}

#[test]
fn test_folder_upload_with_ignored_names() {
    // 13 flat text files plus 7 larger files in a subdirectory; names
    // ending in 2, 6, or 0 are excluded from the transfer.
    let tree = TempDir::new().unwrap();
    let text = b"This is some text\n";
    assert_eq!(text.len(), 18);
    for i in 1..=13 {
        write_file(tree.path(), &format!("file{i}"), text);
    }
    for i in 1..=7 {
        write_file(tree.path(), &format!("sub/data{i}"), &vec![b'd'; 1900]);
    }

    let store = Arc::new(MockStore::new());
    let orch = UploadOrchestrator::new(Arc::clone(&store) as Arc<dyn ObjectStore>);
    let started = orch
        .start_folder_upload(
            tree.path(),
            Some("backup"),
            IgnoreSpec::Patterns(vec!["*2".into(), "*6".into(), "*0".into()]),
        )
        .unwrap();

    // Excluded flat names: file2, file6, file10, file12. Excluded in sub:
    // data2, data6.
    let expected_total = 9 * 18 + 5 * 1900;
    assert_eq!(started.total_bytes, expected_total);

    wait_for_finish(&started.key, Duration::from_secs(10));
    assert_eq!(orch.get_uploaded(&started.key).unwrap(), expected_total);
    assert_eq!(orch.upload_failure(&started.key).unwrap(), None);

    let names = store.object_names();
    assert_eq!(names.len(), 14);
    assert!(names.contains(&"file1".to_string()));
    assert!(names.contains(&"sub/data7".to_string()));
    assert!(!names.iter().any(|n| n.ends_with('2')));
    assert!(!names.iter().any(|n| n.ends_with('6')));
    assert!(!names.iter().any(|n| n.ends_with('0')));

    // The container create precedes every object put.
    assert_eq!(
        store.events().first(),
        Some(&StoreEvent::ContainerCreated("backup".to_string()))
    );
}

#[test]
fn test_segmented_upload_writes_manifest_last() {
    let tree = TempDir::new().unwrap();
    write_file(tree.path(), "big.bin", &vec![b'b'; 12_000_000]);

    let store = Arc::new(MockStore::new());
    let orch = orchestrator(Arc::clone(&store), 5_000_000);
    let remote = orch
        .upload_file(
            None,
            UploadSource::LocalPath(tree.path().join("big.bin")),
            None,
            None,
        )
        .unwrap();

    assert_eq!(remote.bytes, 12_000_000);
    assert_eq!(remote.segments, 3);
    assert!(remote.split);

    let events = store.events();
    assert_eq!(events.len(), 4);
    for (i, expected_len) in [5_000_000u64, 5_000_000, 2_000_000].iter().enumerate() {
        match &events[i] {
            StoreEvent::Object { name, len, md5_hex, .. } => {
                assert_eq!(name, &format!("big.bin.{}", i + 1));
                assert_eq!(len, expected_len);
                assert!(md5_hex.is_some());
            }
            other => panic!("expected segment put, got {other:?}"),
        }
    }
    // The manifest is observed only after every segment succeeded.
    assert_eq!(
        events[3],
        StoreEvent::Manifest {
            container: None,
            name: "big.bin".to_string(),
            segments_prefix: "big.bin.".to_string(),
        }
    );
}

#[test]
fn test_cancel_stops_new_files() {
    let tree = TempDir::new().unwrap();
    for i in 0..200 {
        write_file(tree.path(), &format!("f{i:03}"), &vec![b'c'; 100]);
    }

    let store = Arc::new(MockStore::with_latency(Duration::from_millis(3)));
    let orch = UploadOrchestrator::new(store);
    let started = orch
        .start_folder_upload(tree.path(), None, IgnoreSpec::None)
        .unwrap();
    orch.cancel_folder_upload(&started.key).unwrap();

    wait_for_finish(&started.key, Duration::from_secs(30));
    let uploaded = orch.get_uploaded(&started.key).unwrap();
    assert!(
        uploaded < started.total_bytes,
        "cancellation should leave the job short of {} (got {uploaded})",
        started.total_bytes
    );
    // Cancellation is not a fault and the key stays valid.
    assert_eq!(orch.upload_failure(&started.key).unwrap(), None);
    assert_eq!(orch.get_uploaded(&started.key).unwrap(), uploaded);

    // Cancelling again is a no-op.
    orch.cancel_folder_upload(&started.key).unwrap();
}

#[test]
fn test_progress_is_monotonic_and_bounded() {
    let tree = TempDir::new().unwrap();
    for i in 0..30 {
        write_file(tree.path(), &format!("f{i}"), &vec![b'p'; 50]);
    }

    let store = Arc::new(MockStore::with_latency(Duration::from_millis(2)));
    let orch = UploadOrchestrator::new(store);
    let started = orch
        .start_folder_upload(tree.path(), None, IgnoreSpec::None)
        .unwrap();

    let mut last = 0;
    while !orch.upload_finished(&started.key).unwrap() {
        let now = orch.get_uploaded(&started.key).unwrap();
        assert!(now >= last, "progress went backwards: {last} -> {now}");
        assert!(now <= started.total_bytes);
        assert_eq!(now % 50, 0, "progress must move in whole-file increments");
        last = now;
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(orch.get_uploaded(&started.key).unwrap(), started.total_bytes);
}

#[test]
fn test_unknown_key_rejected() {
    let store = Arc::new(MockStore::new());
    let orch = UploadOrchestrator::new(store);
    let err = orch.get_uploaded("ffffffff-0000-0000-0000-000000000000");
    assert!(matches!(err, Err(UploadError::InvalidUploadId(_))));
}

#[test]
fn test_regular_file_root_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"contents").unwrap();

    let store = Arc::new(MockStore::new());
    let orch = UploadOrchestrator::new(store);
    let err = orch.start_folder_upload(&file, None, IgnoreSpec::None);
    assert!(matches!(err, Err(UploadError::FolderNotFound(_))));
}

#[test]
fn test_store_fault_aborts_job_and_records_cause() {
    let tree = TempDir::new().unwrap();
    write_file(tree.path(), "only.bin", &vec![b'f'; 64]);

    let store = Arc::new(MockStore::failing_on("only.bin"));
    let orch = UploadOrchestrator::new(store);
    let started = orch
        .start_folder_upload(tree.path(), None, IgnoreSpec::None)
        .unwrap();

    wait_for_finish(&started.key, Duration::from_secs(10));
    assert_eq!(orch.get_uploaded(&started.key).unwrap(), 0);
    let cause = orch.upload_failure(&started.key).unwrap().unwrap();
    assert!(cause.contains("injected transport fault"));
}

#[test]
fn test_failed_segment_prevents_manifest() {
    let tree = TempDir::new().unwrap();
    write_file(tree.path(), "split.bin", &vec![b's'; 300]);

    // Segment 2 of 3 fails; the manifest must never be written.
    let store = Arc::new(MockStore::failing_on("split.bin.2"));
    let orch = orchestrator(Arc::clone(&store), 100);
    let err = orch
        .upload_file(
            None,
            UploadSource::LocalPath(tree.path().join("split.bin")),
            None,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, UploadError::UploadFailed { .. }));

    let events = store.events();
    assert!(events
        .iter()
        .all(|e| !matches!(e, StoreEvent::Manifest { .. })));
    // The first segment was already stored and is left in place.
    assert_eq!(store.object_names(), vec!["split.bin.1".to_string()]);
}

#[test]
fn test_empty_file_becomes_empty_object() {
    let tree = TempDir::new().unwrap();
    write_file(tree.path(), "empty.txt", b"");

    let store = Arc::new(MockStore::new());
    let orch = UploadOrchestrator::new(Arc::clone(&store) as Arc<dyn ObjectStore>);
    let started = orch
        .start_folder_upload(tree.path(), None, IgnoreSpec::None)
        .unwrap();
    assert_eq!(started.total_bytes, 0);

    wait_for_finish(&started.key, Duration::from_secs(10));
    assert_eq!(
        store.events(),
        vec![StoreEvent::Object {
            container: None,
            name: "empty.txt".to_string(),
            len: 0,
            md5_hex: Some(format!("{:x}", md5::compute(b""))),
        }]
    );
}

#[test]
fn test_concurrent_jobs_are_isolated() {
    let tree_a = TempDir::new().unwrap();
    let tree_b = TempDir::new().unwrap();
    write_file(tree_a.path(), "a.bin", &vec![b'a'; 500]);
    write_file(tree_b.path(), "b.bin", &vec![b'b'; 700]);

    let store = Arc::new(MockStore::new());
    let failing = Arc::new(MockStore::failing_on("b.bin"));
    let orch_a = UploadOrchestrator::new(store);
    let orch_b = UploadOrchestrator::new(failing);

    let a = orch_a
        .start_folder_upload(tree_a.path(), None, IgnoreSpec::None)
        .unwrap();
    let b = orch_b
        .start_folder_upload(tree_b.path(), None, IgnoreSpec::None)
        .unwrap();

    wait_for_finish(&a.key, Duration::from_secs(10));
    wait_for_finish(&b.key, Duration::from_secs(10));

    assert_eq!(orch_a.get_uploaded(&a.key).unwrap(), 500);
    assert_eq!(orch_a.upload_failure(&a.key).unwrap(), None);
    assert_eq!(orch_b.get_uploaded(&b.key).unwrap(), 0);
    assert!(orch_b.upload_failure(&b.key).unwrap().is_some());
}

#[test]
fn test_single_pattern_string_accepted() {
    let tree = TempDir::new().unwrap();
    write_file(tree.path(), "keep.txt", b"keep");
    write_file(tree.path(), "drop.tmp", b"drop");

    let store = Arc::new(MockStore::new());
    let orch = UploadOrchestrator::new(Arc::clone(&store) as Arc<dyn ObjectStore>);
    let started = orch
        .start_folder_upload(tree.path(), None, "*.tmp")
        .unwrap();
    assert_eq!(started.total_bytes, 4);

    wait_for_finish(&started.key, Duration::from_secs(10));
    assert_eq!(store.object_names(), vec!["keep.txt".to_string()]);
}
