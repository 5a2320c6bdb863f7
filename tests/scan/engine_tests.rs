// Tests for the scan engine
// End-to-end runs of the walk/hash/collect pipeline

use crate::common::{p, sha1_hex, tree, RecordingReporter};
use crossbeam_channel::bounded;
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;
use sweep::scan::collector::Collector;
use sweep::scan::{
    walk_root, Accumulator, CancelToken, Coordinator, Digest, DigestRegistry, FailureKind,
    NullReporter, PathFilter, ScanConfig, ScanEngine, ScanError, ScanStatus, WalkEvent, Worker,
};

fn run(config: &ScanConfig) -> sweep::ScanReport {
    ScanEngine::default()
        .scan(config, &mut NullReporter, &CancelToken::new())
        .unwrap()
}

fn fixture() -> tempfile::TempDir {
    tree(&[
        ("a.txt", "hello"),
        ("b.txt", "world"),
        ("nested/deeper/c.txt", "third"),
        ("nested/empty.txt", ""),
    ])
}

#[test]
fn test_scan_scenario_with_ignored_git_dir() {
    let dir = tree(&[("a.txt", "hello"), ("b.txt", "world"), (".git/config", "x")]);
    let root = dir.path();
    let config = ScanConfig::new("sha1")
        .with_root(root)
        .with_ignored(format!("{}/.git", root.display()));

    let report = run(&config);

    let expected = BTreeMap::from([
        (p(root, "a.txt"), sha1_hex(b"hello")),
        (p(root, "b.txt"), sha1_hex(b"world")),
    ]);
    assert_eq!(report.digests(), expected);
    assert!(report.failures.is_empty());
    assert_eq!(report.status, ScanStatus::Completed);
}

#[test]
fn test_every_file_hashed_exactly_once() {
    let dir = fixture();
    let root = dir.path();
    let report = run(&ScanConfig::new("sha256").with_root(root));

    assert_eq!(report.records.len(), 4);
    assert_eq!(report.digests().len(), 4);
    for record in &report.records {
        let content = fs::read(&record.path).unwrap();
        assert_eq!(record.digest.to_hex(), hex::encode(Sha256::digest(&content)));
        assert_eq!(record.size, content.len() as u64);
    }
    assert_eq!(report.stats.files_hashed, 4);
    assert_eq!(report.stats.bytes_hashed, 15);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = fixture();
    let config = ScanConfig::new("md5").with_root(dir.path());

    let first = run(&config).digests();
    let second = run(&config).digests();

    assert_eq!(first, second);
}

#[test]
fn test_pool_size_does_not_change_results() {
    let dir = tree(&[]);
    for i in 0..50 {
        let path = dir.path().join(format!("d{}/f{}.txt", i % 7, i));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("content {}", i).repeat(i + 1)).unwrap();
    }

    let results: Vec<BTreeMap<PathBuf, String>> = [1, 4, 64]
        .iter()
        .map(|&workers| {
            let config = ScanConfig::new("sha1")
                .with_root(dir.path())
                .with_workers(workers)
                .with_queue_depth(2)
                .with_buffer_size(16);
            run(&config).digests()
        })
        .collect();

    assert_eq!(results[0].len(), 50);
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[test]
fn test_rendezvous_queues_still_drain() {
    let dir = fixture();
    let config = ScanConfig::new("sha1")
        .with_root(dir.path())
        .with_workers(2)
        .with_queue_depth(0);

    assert_eq!(run(&config).records.len(), 4);
}

#[test]
fn test_unknown_algorithm_fails_before_traversal() {
    let dir = fixture();
    let config = ScanConfig::new("unknown").with_root(dir.path());
    let mut reporter = RecordingReporter::default();

    let result = ScanEngine::default().scan(&config, &mut reporter, &CancelToken::new());

    match result {
        Err(ScanError::UnsupportedAlgorithm { algorithm }) => assert_eq!(algorithm, "unknown"),
        other => panic!("Expected UnsupportedAlgorithm, got {:?}", other),
    }
    assert!(reporter.roots.is_empty());
    assert!(reporter.hashed.is_empty());
}

#[test]
fn test_zero_workers_rejected() {
    let config = ScanConfig::new("sha1").with_workers(0);
    let result = ScanEngine::default().scan(&config, &mut NullReporter, &CancelToken::new());
    assert!(matches!(result, Err(ScanError::InvalidConfig { .. })));
}

#[test]
fn test_empty_roots_scan_nothing() {
    let report = run(&ScanConfig::new("sha1"));
    assert!(report.records.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.status, ScanStatus::Completed);
}

#[test]
fn test_default_root_used_when_opted_in() {
    let dir = fixture();
    let report = run(&ScanConfig::new("sha1").with_default_root(dir.path()));
    assert_eq!(report.records.len(), 4);
}

#[test]
fn test_missing_root_does_not_affect_others() {
    let dir = fixture();
    let missing = dir.path().join("nope");
    let config = ScanConfig::new("sha1")
        .with_root(dir.path().join("nested"))
        .with_root(&missing);

    let report = run(&config);

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, missing);
    assert_eq!(report.failures[0].kind, FailureKind::TraversalRootMissing);
}

#[test]
fn test_overlapping_roots_walk_independently() {
    let dir = fixture();
    let config = ScanConfig::new("sha1")
        .with_root(dir.path())
        .with_root(dir.path().join("nested"));

    let report = run(&config);

    // Files under "nested" are found once per root
    assert_eq!(report.records.len(), 6);
    assert_eq!(report.digests().len(), 4);
}

#[test]
fn test_reporter_sees_roots_and_files() {
    let dir = fixture();
    let config = ScanConfig::new("sha1").with_root(dir.path());
    let mut reporter = RecordingReporter::default();

    let report = ScanEngine::default()
        .scan(&config, &mut reporter, &CancelToken::new())
        .unwrap();

    assert_eq!(reporter.roots, vec![dir.path().to_path_buf()]);
    assert_eq!(reporter.hashed.len(), report.records.len());
    assert!(reporter.failed.is_empty());
}

#[cfg(unix)]
#[test]
fn test_unopenable_file_reports_open_failed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree(&[("a.txt", "hello"), ("locked.txt", "secret"), ("b.txt", "world")]);
    let locked = dir.path().join("locked.txt");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::File::open(&locked).is_ok() {
        // Running with privileges that ignore file modes
        return;
    }

    let mut reporter = RecordingReporter::default();
    let report = ScanEngine::default()
        .scan(
            &ScanConfig::new("sha1").with_root(dir.path()),
            &mut reporter,
            &CancelToken::new(),
        )
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(!report.digests().contains_key(&locked));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, locked);
    assert_eq!(report.failures[0].kind, FailureKind::OpenFailed);
    assert_eq!(reporter.failed.len(), 1);
    assert_eq!(report.digests()[&dir.path().join("a.txt")], sha1_hex(b"hello"));
}

#[test]
fn test_file_removed_after_discovery_reports_open_failed() {
    let dir = tree(&[("a.txt", "hello"), ("gone.txt", "bye"), ("b.txt", "world")]);
    let root = dir.path();
    let gone = root.join("gone.txt");

    let mut discovered = Vec::new();
    walk_root(root, &PathFilter::default(), &CancelToken::new(), |event| {
        if let WalkEvent::File(file) = event {
            discovered.push(file);
        }
        ControlFlow::Continue(())
    });
    assert_eq!(discovered.len(), 3);

    // Discovered but gone by the time a worker opens it
    fs::remove_file(&gone).unwrap();

    let coordinator = Coordinator::new(CancelToken::new());
    let (work_tx, work_rx) = bounded(discovered.len());
    let (result_tx, result_rx) = bounded(discovered.len());
    for file in discovered {
        coordinator.register();
        work_tx.send(file).unwrap();
    }
    drop(work_tx);

    let algorithm = DigestRegistry::builtin().resolve("sha1").unwrap();
    let stats = Worker::new(0, algorithm.accumulator(), 4096).run(work_rx, result_tx, &coordinator);
    let mut reporter = RecordingReporter::default();
    let collected = Collector::new(&mut reporter, &coordinator).drain(result_rx);

    assert_eq!(stats.hashed, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(coordinator.in_flight(), 0);
    assert_eq!(collected.failures.len(), 1);
    assert_eq!(collected.failures[0].path, gone);
    assert_eq!(collected.failures[0].kind, FailureKind::OpenFailed);
    assert_eq!(reporter.failed.len(), 1);

    let digests: BTreeMap<PathBuf, String> = collected
        .records
        .iter()
        .map(|record| (record.path.clone(), record.digest.to_hex()))
        .collect();
    let expected = BTreeMap::from([
        (p(root, "a.txt"), sha1_hex(b"hello")),
        (p(root, "b.txt"), sha1_hex(b"world")),
    ]);
    assert_eq!(digests, expected);
}

#[cfg(unix)]
#[test]
fn test_unlistable_directory_reported_and_siblings_hashed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tree(&[("a.txt", "hello"), ("locked/secret.txt", "secret")]);
    let locked = dir.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // Running with privileges that ignore directory modes
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let mut reporter = RecordingReporter::default();
    let report = ScanEngine::default()
        .scan(
            &ScanConfig::new("sha1").with_root(dir.path()),
            &mut reporter,
            &CancelToken::new(),
        )
        .unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.digests()[&dir.path().join("a.txt")], sha1_hex(b"hello"));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, locked);
    assert_eq!(report.failures[0].kind, FailureKind::Unreadable);
    assert_eq!(reporter.failed.len(), 1);
    assert!(!report.is_clean());
}

#[test]
fn test_cancelled_scan_returns_partial_report() {
    let dir = fixture();
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = ScanEngine::default()
        .scan(&ScanConfig::new("sha1").with_root(dir.path()), &mut NullReporter, &cancel)
        .unwrap();

    assert_eq!(report.status, ScanStatus::Cancelled);
    assert!(report.records.is_empty());
    assert!(!report.is_clean());
}

#[test]
fn test_cancel_from_reporter_mid_scan() {
    struct CancelAfterFirst {
        cancel: CancelToken,
        seen: usize,
    }

    impl sweep::scan::Reporter for CancelAfterFirst {
        fn hashed(&mut self, _record: &sweep::scan::FileRecord) {
            self.seen += 1;
            self.cancel.cancel();
        }
    }

    let dir = tree(&[]);
    for i in 0..200 {
        fs::write(dir.path().join(format!("f{}.txt", i)), format!("{}", i)).unwrap();
    }
    let cancel = CancelToken::new();
    let mut reporter = CancelAfterFirst {
        cancel: cancel.clone(),
        seen: 0,
    };

    let report = ScanEngine::default()
        .scan(
            &ScanConfig::new("sha1")
                .with_root(dir.path())
                .with_workers(2)
                .with_queue_depth(1),
            &mut reporter,
            &cancel,
        )
        .unwrap();

    assert_eq!(report.status, ScanStatus::Cancelled);
    assert!(reporter.seen >= 1);
    assert!(report.records.len() < 200);
    assert_eq!(report.records.len(), reporter.seen);
}

/// Counts bytes instead of hashing, to check the engine uses the injected registry
struct Length(u64);

impl Accumulator for Length {
    fn update(&mut self, data: &[u8]) {
        self.0 += data.len() as u64;
    }

    fn finalize_reset(&mut self) -> Digest {
        let digest = Digest::new(self.0.to_be_bytes().to_vec());
        self.0 = 0;
        digest
    }

    fn reset(&mut self) {
        self.0 = 0;
    }

    fn output_size(&self) -> usize {
        8
    }
}

#[test]
fn test_engine_uses_injected_registry() {
    let dir = fixture();
    let registry = DigestRegistry::empty().register("length", 64, || Box::new(Length(0)));
    let engine = ScanEngine::new(registry);
    assert!(engine.registry().contains("length"));
    assert!(!engine.registry().contains("sha1"));

    let report = engine
        .scan(
            &ScanConfig::new("length").with_root(dir.path()).with_workers(1),
            &mut NullReporter,
            &CancelToken::new(),
        )
        .unwrap();

    for record in &report.records {
        let expected = fs::metadata(&record.path).unwrap().len();
        assert_eq!(record.digest.as_bytes(), &expected.to_be_bytes());
    }
    assert!(engine.scan(&ScanConfig::new("sha1"), &mut NullReporter, &CancelToken::new()).is_err());
}

#[test]
fn test_convenience_scan() {
    let dir = fixture();
    let records = sweep::scan(&ScanConfig::new("sha1").with_root(dir.path())).unwrap();
    assert_eq!(records.len(), 4);
}
