//! In-memory backend with manual event injection.
//!
//! Writes never emit events by themselves; callers pair a write with
//! [`MemoryFileSystem::emit_change`] or [`MemoryFileSystem::emit_create`]
//! to control exactly when a rescan is triggered.

use super::{
    DirEntry, EventSink, FileKind, FileStat, FileSystem, Subscription, WatchEvent,
    WatchEventKind, WatchScope,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
    /// Socket, device or dangling entry: exists but is neither file nor directory
    Special,
}

struct Subscriber {
    id: u64,
    scope: WatchScope,
    sink: EventSink,
}

#[derive(Default)]
struct MemoryState {
    nodes: BTreeMap<PathBuf, Node>,
    subscribers: Vec<Subscriber>,
    next_subscriber_id: u64,
    failing_reads: HashSet<PathBuf>,
    reads: usize,
}

/// Removes its subscriber when the owning [`Subscription`] is released.
struct SubscriberGuard {
    id: u64,
    state: Weak<Mutex<MemoryState>>,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state.lock().subscribers.retain(|s| s.id != self.id);
        }
    }
}

#[derive(Clone)]
pub struct MemoryFileSystem {
    state: Arc<Mutex<MemoryState>>,
    stat_gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        state.nodes.insert(PathBuf::from("/"), Node::Directory);
        Self {
            state: Arc::new(Mutex::new(state)),
            stat_gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Create or overwrite a file, creating missing parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        insert_parents(&mut state.nodes, path);
        state
            .nodes
            .insert(path.to_path_buf(), Node::File(contents.into()));
    }

    pub fn create_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        insert_parents(&mut state.nodes, path);
        state.nodes.insert(path.to_path_buf(), Node::Directory);
    }

    /// Add an entry that is neither a file nor a directory.
    pub fn create_special(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock();
        insert_parents(&mut state.nodes, path);
        state.nodes.insert(path.to_path_buf(), Node::Special);
    }

    /// Remove an entry and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.state.lock().nodes.retain(|p, _| !p.starts_with(path));
    }

    /// Make every subsequent read of `path` fail with `PermissionDenied`.
    pub fn fail_reads_of(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .failing_reads
            .insert(path.as_ref().to_path_buf());
    }

    pub fn clear_read_failures(&self) {
        self.state.lock().failing_reads.clear();
    }

    /// Number of `read_file` calls served so far.
    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    pub fn emit_change(&self, path: impl AsRef<Path>) -> usize {
        self.emit(WatchEventKind::Changed, path.as_ref())
    }

    pub fn emit_create(&self, path: impl AsRef<Path>) -> usize {
        self.emit(WatchEventKind::Created, path.as_ref())
    }

    /// Deliver an event to every subscription whose scope covers `path`.
    /// Returns how many subscriptions received it.
    pub fn emit(&self, kind: WatchEventKind, path: &Path) -> usize {
        let state = self.state.lock();
        state
            .subscribers
            .iter()
            .filter(|s| s.scope.matches(path))
            .filter(|s| {
                s.sink
                    .send(WatchEvent {
                        kind,
                        path: path.to_path_buf(),
                    })
                    .is_ok()
            })
            .count()
    }

    /// Hold every `stat` call until [`MemoryFileSystem::release_stat`].
    pub fn hold_stat(&self) {
        *self.stat_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let held and future `stat` calls through.
    pub fn release_stat(&self) {
        if let Some(gate) = self.stat_gate.lock().take() {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }
}

fn insert_parents(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert(Node::Directory);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let gate = self.stat_gate.lock().clone();
        if let Some(gate) = gate {
            // Closed semaphores never happen here; either way, proceed
            let _ = gate.acquire().await;
        }

        let state = self.state.lock();
        match state.nodes.get(path) {
            Some(Node::File(bytes)) => Ok(FileStat {
                kind: FileKind::File,
                size: bytes.len() as u64,
            }),
            Some(Node::Directory) => Ok(FileStat {
                kind: FileKind::Directory,
                size: 0,
            }),
            Some(Node::Special) => Ok(FileStat {
                kind: FileKind::Unknown,
                size: 0,
            }),
            None => Err(not_found(path)),
        }
    }

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.failing_reads.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{}: permission denied", path.display()),
            ));
        }
        match state.nodes.get(path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            Some(_) => Err(io::Error::other(format!(
                "{}: not a regular file",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }

    async fn read_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.lock();
        match state.nodes.get(path) {
            Some(Node::Directory) => {}
            Some(_) => {
                return Err(io::Error::other(format!(
                    "{}: not a directory",
                    path.display()
                )));
            }
            None => return Err(not_found(path)),
        }
        Ok(state
            .nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, node)| {
                let name = p.file_name()?.to_os_string();
                let kind = match node {
                    Node::File(_) => FileKind::File,
                    Node::Directory => FileKind::Directory,
                    Node::Special => FileKind::Unknown,
                };
                Some(DirEntry::new(name, kind))
            })
            .collect())
    }

    fn subscribe(&self, scope: &WatchScope, sink: EventSink) -> anyhow::Result<Subscription> {
        let mut state = self.state.lock();
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;
        state.subscribers.push(Subscriber {
            id,
            scope: scope.clone(),
            sink,
        });
        Ok(Subscription::new(
            scope.glob(),
            SubscriberGuard {
                id,
                state: Arc::downgrade(&self.state),
            },
        ))
    }
}
