use std::fs::File;
use std::time::{Duration, SystemTime};

use hoist_host::{SweepReport, sweep};
use tempfile::TempDir;

const TTL: Duration = Duration::from_secs(5 * 60);

fn touch(path: &std::path::Path, age: Duration) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = File::create(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

#[test]
fn removes_only_files_older_than_ttl() {
    let tmp = TempDir::new().unwrap();
    let stale = tmp.path().join("index.html");
    let fresh = tmp.path().join("recent.html");
    touch(&stale, Duration::from_secs(6 * 60));
    touch(&fresh, Duration::from_secs(60));

    let report = sweep(tmp.path(), TTL, SystemTime::now()).unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.kept, 1);
    assert!(!stale.exists());
    assert!(fresh.exists());
}

#[test]
fn recurses_into_nested_cache_directories() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("t/rust/page.html"), Duration::from_secs(10 * 60));
    touch(&tmp.path().join("u/alice.html"), Duration::from_secs(10 * 60));

    let report = sweep(tmp.path(), TTL, SystemTime::now()).unwrap();

    assert_eq!(report.removed, 2);
    assert!(tmp.path().join("t/rust").is_dir());
}

#[test]
fn every_file_expires_within_one_tick_after_ttl() {
    let tmp = TempDir::new().unwrap();
    touch(&tmp.path().join("a.html"), Duration::ZERO);
    touch(&tmp.path().join("b.html"), Duration::from_secs(30));

    let now = SystemTime::now();
    assert_eq!(sweep(tmp.path(), TTL, now).unwrap().removed, 0);

    let one_tick_after_ttl = now + TTL + Duration::from_secs(60);
    let report = sweep(tmp.path(), TTL, one_tick_after_ttl).unwrap();
    assert_eq!(report.removed, 2);
    assert_eq!(report.kept, 0);
}

#[test]
fn future_modification_time_is_kept() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("skewed.html");
    let file = File::create(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();

    let report = sweep(tmp.path(), TTL, SystemTime::now()).unwrap();
    assert_eq!(report.kept, 1);
    assert!(path.exists());
}

#[test]
fn missing_directory_is_an_empty_sweep() {
    let tmp = TempDir::new().unwrap();
    let report = sweep(&tmp.path().join("never-created"), TTL, SystemTime::now()).unwrap();
    assert_eq!(report, SweepReport::default());
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed_or_removed() {
    let tmp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let target = outside.path().join("keep.txt");
    touch(&target, Duration::from_secs(3600));
    std::os::unix::fs::symlink(&target, tmp.path().join("link")).unwrap();

    let report = sweep(tmp.path(), TTL, SystemTime::now()).unwrap();

    assert_eq!(report.removed, 0);
    assert!(target.exists());
    assert!(tmp.path().join("link").symlink_metadata().is_ok());
}
