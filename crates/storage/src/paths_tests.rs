// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn default_layout() {
    let paths = RelayPaths::new("/srv/relay");
    assert_eq!(paths.intake, Path::new("/srv/relay/in"));
    assert_eq!(paths.results, Path::new("/srv/relay/out"));
    assert_eq!(paths.archive, Path::new("/srv/relay/archive"));
    assert_eq!(paths.ledger, Path::new("/srv/relay/ledger.jsonl"));
    assert_eq!(paths.log_file(), Path::new("/srv/relay/logs/relay.log"));
    assert_eq!(paths.config_file(), Path::new("/srv/relay/relay.toml"));
}

#[test]
fn ensure_dirs_creates_overridden_locations() {
    let dir = tempdir().unwrap();
    let mut paths = RelayPaths::new(dir.path());
    paths.results = dir.path().join("elsewhere/results");
    paths.ledger = dir.path().join("audit/ledger.jsonl");
    paths.ensure_dirs().unwrap();
    for d in [&paths.intake, &paths.results, &paths.archive, &paths.logs] {
        assert!(d.is_dir(), "{} missing", d.display());
    }
    assert!(dir.path().join("audit").is_dir());
}

#[cfg(unix)]
#[test]
fn canonicalized_resolves_symlinked_root() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    let link = dir.path().join("link");
    std::fs::create_dir(&real).unwrap();
    std::os::unix::fs::symlink(&real, &link).unwrap();

    let paths = RelayPaths::new(&link);
    paths.ensure_dirs().unwrap();
    let resolved = paths.canonicalized().unwrap();

    let real = real.canonicalize().unwrap();
    assert_eq!(resolved.root, real);
    assert_eq!(resolved.intake, real.join("in"));
    assert_eq!(resolved.ledger, real.join("ledger.jsonl"));
    assert_eq!(resolved.lock, real.join("relay.pid"));
    assert!(!resolved.ledger.exists());
}

#[test]
fn canonicalized_fails_before_dirs_exist() {
    let dir = tempdir().unwrap();
    let paths = RelayPaths::new(dir.path().join("missing"));
    assert!(matches!(paths.canonicalized(), Err(StoreError::Io { .. })));
}
