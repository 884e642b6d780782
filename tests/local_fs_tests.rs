//! Smoke tests for the real filesystem backend.

use jscad_preview::data_watcher::{DataWatcher, ScanOptions, WatchOptions};
use jscad_preview::fs::{FileKind, FileSystem, LocalFileSystem};
use jscad_preview::protocol::{DirectoryNode, TreeRef};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

fn local_watcher(debounce_ms: u64) -> DataWatcher<LocalFileSystem> {
    DataWatcher::new(
        Arc::new(LocalFileSystem::new()),
        ScanOptions {
            debounce: Duration::from_millis(debounce_ms),
            ..ScanOptions::default()
        },
    )
}

/// Start watching `target`, returning the channel trees are delivered on.
async fn watch_local(
    watcher: &DataWatcher<LocalFileSystem>,
    target: &Path,
) -> UnboundedReceiver<DirectoryNode> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    watcher
        .watch(
            target,
            move |root| {
                let _ = tx.send(root);
            },
            WatchOptions::default(),
        )
        .await
        .unwrap();
    rx
}

/// Receive trees until one satisfies `accept`, failing after five seconds.
async fn next_tree_where(
    rx: &mut UnboundedReceiver<DirectoryNode>,
    accept: impl Fn(&DirectoryNode) -> bool,
) -> DirectoryNode {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let root = rx.recv().await.expect("watcher callback dropped");
            if accept(&root) {
                return root;
            }
        }
    })
    .await
    .expect("timed out waiting for a matching tree")
}

fn source_at(root: &DirectoryNode, full_path: &str) -> Option<String> {
    match root.find(full_path) {
        Some(TreeRef::File(f)) => Some(f.source.clone()),
        _ => None,
    }
}

fn project() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("b.js"), "B").unwrap();
    fs::write(root.join("a.js"), "A").unwrap();
    fs::write(root.join("notes.txt"), "ignored").unwrap();
    fs::write(root.join("sub/c.js"), "C").unwrap();
    temp_dir
}

#[tokio::test]
async fn test_stat_and_sorted_listing() {
    let temp_dir = project();
    let fs = LocalFileSystem::new();

    let stat = fs.stat(temp_dir.path()).await.unwrap();
    assert_eq!(stat.kind, FileKind::Directory);
    let stat = fs.stat(&temp_dir.path().join("a.js")).await.unwrap();
    assert_eq!(stat.kind, FileKind::File);
    assert_eq!(stat.size, 1);

    let entries = fs.read_directory(temp_dir.path()).await.unwrap();
    let names: Vec<String> = entries.iter().map(|e| e.display_name().into_owned()).collect();
    assert_eq!(names, vec!["a.js", "b.js", "notes.txt", "sub"]);

    assert_eq!(fs.read_file(&temp_dir.path().join("sub/c.js")).await.unwrap(), b"C");
    assert!(fs.stat(&temp_dir.path().join("missing")).await.is_err());
}

#[tokio::test]
async fn test_scan_once_on_disk() {
    let temp_dir = project();
    let watcher = DataWatcher::new(Arc::new(LocalFileSystem::new()), ScanOptions::default());

    let root = watcher.scan_once(temp_dir.path()).await.unwrap();
    assert_eq!(root.file_count(), 3);
    assert!(matches!(root.find("/root/sub/c.js"), Some(TreeRef::File(f)) if f.source == "C"));
    assert!(root.find("/root/notes.txt").is_none());

    let single = watcher
        .scan_once(&temp_dir.path().join("a.js"))
        .await
        .unwrap();
    assert!(matches!(single.find("/root/index.js"), Some(TreeRef::File(f)) if f.source == "A"));
}

#[tokio::test]
async fn test_watch_delivers_initial_tree_and_unsubscribes() {
    let temp_dir = project();
    let watcher = local_watcher(20);
    let mut rx = watch_local(&watcher, temp_dir.path()).await;

    let root = next_tree_where(&mut rx, |_| true).await;
    assert_eq!(root.file_count(), 3);
    assert!(watcher.is_watching());
    assert!(watcher.options().filter.matches("x.js"));

    watcher.dispose();
    assert!(!watcher.is_watching());
}

#[tokio::test]
async fn test_directory_target_rescans_on_disk_change() {
    let temp_dir = project();
    fs::write(temp_dir.path().join("sub/b.js"), "B").unwrap();
    let watcher = local_watcher(20);
    let mut rx = watch_local(&watcher, temp_dir.path()).await;

    let root = next_tree_where(&mut rx, |_| true).await;
    assert_eq!(source_at(&root, "/root/sub/b.js").as_deref(), Some("B"));

    fs::write(temp_dir.path().join("sub/b.js"), "B2").unwrap();
    let root = next_tree_where(&mut rx, |root| {
        source_at(root, "/root/sub/b.js").as_deref() == Some("B2")
    })
    .await;
    assert_eq!(root.file_count(), 4);
}

#[tokio::test]
async fn test_single_file_target_sees_atomic_save() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model = temp_dir.path().join("model.js");
    fs::write(&model, "v1").unwrap();
    let watcher = local_watcher(20);
    let mut rx = watch_local(&watcher, &model).await;

    let root = next_tree_where(&mut rx, |_| true).await;
    assert_eq!(source_at(&root, "/root/index.js").as_deref(), Some("v1"));

    // Write a temp file and rename it over the target, as editors do
    let temp_file = temp_dir.path().join("model.js.tmp");
    fs::write(&temp_file, "v2").unwrap();
    fs::rename(&temp_file, &model).unwrap();

    let root = next_tree_where(&mut rx, |root| {
        source_at(root, "/root/index.js").as_deref() == Some("v2")
    })
    .await;
    assert_eq!(root.children.len(), 1);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_names_do_not_break_scans() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::write(root.join("a.js"), "A").unwrap();
    fs::write(root.join(OsStr::from_bytes(b"caf\xe9.js")), "latin1").unwrap();
    fs::create_dir(root.join(OsStr::from_bytes(b"d\xff"))).unwrap();
    fs::write(
        root.join(OsStr::from_bytes(b"d\xff")).join("inner.js"),
        "inner",
    )
    .unwrap();

    let watcher = local_watcher(0);
    let tree = watcher.scan_once(root).await.unwrap();
    assert_eq!(tree.file_count(), 3);
    assert_eq!(source_at(&tree, "/root/a.js").as_deref(), Some("A"));
    assert_eq!(
        source_at(&tree, "/root/caf\u{fffd}.js").as_deref(),
        Some("latin1")
    );
    assert_eq!(
        source_at(&tree, "/root/d\u{fffd}/inner.js").as_deref(),
        Some("inner")
    );
}
