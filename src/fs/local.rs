//! Local disk backend: `tokio::fs` for reads, `notify` for change events.

use super::{
    DirEntry, EventSink, FileKind, FileStat, FileSystem, Subscription, WatchEvent,
    WatchEventKind, WatchScope,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn kind_of(file_type: std::fs::FileType) -> FileKind {
    if file_type.is_symlink() {
        FileKind::SymbolicLink
    } else if file_type.is_dir() {
        FileKind::Directory
    } else if file_type.is_file() {
        FileKind::File
    } else {
        FileKind::Unknown
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            kind: kind_of(metadata.file_type()),
            size: metadata.len(),
        })
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn read_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut reader = tokio::fs::read_dir(path).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let kind = kind_of(entry.file_type().await?);
            entries.push(DirEntry::new(entry.file_name(), kind));
        }
        // read_dir order is platform dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn subscribe(&self, scope: &WatchScope, sink: EventSink) -> Result<Subscription> {
        let root = scope.root();
        let canonical: PathBuf = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        // Backends report canonical paths, so match against the canonical scope
        let scope = scope.with_root(canonical.clone());

        // Single files are watched through their parent: atomic saves replace
        // the file's inode
        let (watch_path, mode) = match &scope {
            WatchScope::File(path) => (
                path.parent()
                    .context("Watched file has no parent directory")?
                    .to_path_buf(),
                RecursiveMode::NonRecursive,
            ),
            WatchScope::Tree { root, .. } => (root.clone(), RecursiveMode::Recursive),
        };

        let description = scope.glob();
        let handler_scope = scope.clone();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(
            move |result: std::result::Result<Event, notify::Error>| {
                let event = match result {
                    Ok(event) => event,
                    Err(e) => {
                        log::warn!("File watcher error: {}", e);
                        return;
                    }
                };
                let kind = match event.kind {
                    EventKind::Create(_) => WatchEventKind::Created,
                    EventKind::Modify(_) => WatchEventKind::Changed,
                    other => {
                        log::trace!("Ignoring event kind: {:?}", other);
                        return;
                    }
                };
                for path in event.paths {
                    if !handler_scope.matches(&path) {
                        log::trace!("Path {:?} outside watch scope", path);
                        continue;
                    }
                    if sink.send(WatchEvent { kind, path }).is_err() {
                        // Receiver gone: the watcher is being torn down
                        return;
                    }
                }
            },
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_path, mode)
            .with_context(|| format!("Failed to watch {}", watch_path.display()))?;
        log::debug!("Watching {} for {}", watch_path.display(), description);

        Ok(Subscription::new(description, watcher))
    }
}
