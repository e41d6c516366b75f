//! Create-mode behaviour against real and in-memory filesystems.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use kiln_adapters::{LocalFilesystem, MemoryFilesystem};
use kiln_core::prelude::*;
use tempfile::TempDir;

fn sample_entries() -> Vec<FileEntry> {
    vec![
        FileEntry::new("package.json", "{\n  \"name\": \"app\"\n}\n"),
        FileEntry::new("src/index.ts", "export {};\n"),
        FileEntry::new("src/components/Button.tsx", "export const Button = 1;\n"),
        FileEntry::binary_placeholder("public/logo.png"),
    ]
}

fn leftover_staging(parent: &Path) -> Vec<String> {
    std::fs::read_dir(parent)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(".tmp-"))
        .collect()
}

#[test]
fn materializes_complete_tree_on_disk() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app");

    let report = AtomicWriter::new(Box::new(LocalFilesystem::new()))
        .materialize(&target, sample_entries())
        .unwrap();

    assert_eq!(report.promotion, Promotion::Renamed);
    assert_eq!(report.written.len(), 3);
    assert_eq!(report.skipped_binary, vec!["public/logo.png".to_string()]);
    assert_eq!(
        std::fs::read_to_string(target.join("src/components/Button.tsx")).unwrap(),
        "export const Button = 1;\n"
    );
    assert!(!target.join("public/logo.png").exists());
    assert!(leftover_staging(dir.path()).is_empty());
}

#[test]
fn target_holds_exactly_the_batch() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app");
    let entries = vec![
        FileEntry::new("src/index.ts", "export const answer = 42;\n"),
        FileEntry::new("README.md", "# app\n"),
        FileEntry::new("assets/logo.svg", "<svg/>"),
    ];

    AtomicWriter::new(Box::new(LocalFilesystem::new()))
        .materialize(&target, entries)
        .unwrap();

    let expected = BTreeMap::from([
        ("README.md".to_string(), "# app\n".to_string()),
        ("assets/logo.svg".to_string(), "<svg/>".to_string()),
        ("src/index.ts".to_string(), "export const answer = 42;\n".to_string()),
    ]);
    assert_eq!(tree_contents(&target), expected);
    assert!(leftover_staging(dir.path()).is_empty());
}

#[test]
fn existing_target_is_left_untouched() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep.txt"), "mine").unwrap();

    let err = AtomicWriter::new(Box::new(LocalFilesystem::new()))
        .materialize(&target, sample_entries())
        .unwrap_err();

    assert_eq!(err.kind(), "target-exists");
    assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "mine");
    assert_eq!(std::fs::read_dir(&target).unwrap().count(), 1);
    assert!(leftover_staging(dir.path()).is_empty());
}

#[test]
fn traversal_rejects_whole_batch_before_staging() {
    let fs = MemoryFilesystem::new();
    let entries = vec![
        FileEntry::new("ok.txt", "fine"),
        FileEntry::new("../../etc/passwd", "nope"),
    ];

    let err = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/app", entries)
        .unwrap_err();

    assert_eq!(err.kind(), "path-traversal");
    assert!(fs.entries_under("/work").is_empty());
    assert!(fs.list_files().is_empty());
}

#[test]
fn write_failure_removes_staging_and_target() {
    let fs = MemoryFilesystem::new();
    fs.fail_writes_containing("Button");

    let err = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/app", sample_entries())
        .unwrap_err();

    assert_eq!(err.kind(), "write-failed");
    if let KilnError::Application(e) = &err {
        assert!(e.written_paths().is_empty());
    }
    assert!(fs.entries_under("/work").is_empty());
}

#[test]
fn rename_failure_falls_back_to_copy() {
    let fs = MemoryFilesystem::new();
    fs.fail_renames();

    let report = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/app", sample_entries())
        .unwrap();

    assert_eq!(report.promotion, Promotion::Copied);
    assert_eq!(fs.contents("/work/app/src/index.ts").as_deref(), Some("export {};\n"));
    let leftovers: Vec<_> = fs
        .entries_under("/work")
        .into_iter()
        .filter(|p| p.to_string_lossy().contains(".tmp-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn failed_copy_fallback_leaves_nothing_behind() {
    let fs = MemoryFilesystem::new();
    fs.fail_renames();
    fs.fail_copy_after(1);

    let err = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/app", sample_entries())
        .unwrap_err();

    assert_eq!(err.kind(), "promotion-failed");
    assert!(!fs.exists(Path::new("/work/app")));
    assert!(fs.entries_under("/work").is_empty());
}

#[test]
fn cancellation_before_promotion_discards_everything() {
    let fs = MemoryFilesystem::new();
    let token = CancellationToken::new();
    token.cancel();

    let err = AtomicWriter::new(Box::new(fs.clone()))
        .with_cancellation(token)
        .materialize("/work/app", sample_entries())
        .unwrap_err();

    assert_eq!(err.kind(), "cancelled");
    assert!(fs.entries_under("/work").is_empty());
}

#[test]
fn missing_parent_fails_without_residue() {
    let fs = MemoryFilesystem::new();

    let err = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/missing/app", sample_entries())
        .unwrap_err();

    assert_eq!(err.kind(), "filesystem");
    assert!(fs.entries_under("/work").is_empty());
}

#[test]
fn duplicate_paths_keep_last_content() {
    let fs = MemoryFilesystem::new();
    let entries = vec![
        FileEntry::new("a.txt", "first"),
        FileEntry::new("./a.txt", "second"),
    ];

    let report = AtomicWriter::new(Box::new(fs.clone()))
        .materialize("/work/app", entries)
        .unwrap();

    assert_eq!(report.written, vec!["a.txt".to_string()]);
    assert_eq!(fs.contents("/work/app/a.txt").as_deref(), Some("second"));
}

/// An observer polling the target never sees a partial tree.
#[test]
fn concurrent_observer_sees_nothing_or_everything() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("app");

    let entries: Vec<FileEntry> = (0..200)
        .map(|i| FileEntry::new(format!("src/mod{i}/file{i}.ts"), format!("export const v = {i};\n")))
        .collect();
    let expected = entries.len();

    let stop = Arc::new(AtomicBool::new(false));
    let observer = {
        let stop = stop.clone();
        let target = target.clone();
        thread::spawn(move || {
            let mut partial_sightings = 0;
            while !stop.load(Ordering::SeqCst) {
                if target.exists() {
                    let count = walk_files(&target);
                    if count != expected {
                        partial_sightings += 1;
                    }
                }
            }
            partial_sightings
        })
    };

    AtomicWriter::new(Box::new(LocalFilesystem::new()))
        .materialize(&target, entries)
        .unwrap();
    stop.store(true, Ordering::SeqCst);

    assert_eq!(observer.join().unwrap(), 0);
    assert_eq!(walk_files(&target), expected);
}

/// Every regular file under `root`, keyed by slash-separated relative path.
fn tree_contents(root: &Path) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir).unwrap().flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                files.insert(key, std::fs::read_to_string(&path).unwrap());
            }
        }
    }
    files
}

fn walk_files(root: &Path) -> usize {
    let mut count = 0;
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(read) = std::fs::read_dir(&dir) else { continue };
        for entry in read.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}
