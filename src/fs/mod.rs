//! Filesystem capability used by the change watcher.
//!
//! The watcher only needs four primitives: stat, read a file, list a
//! directory, and subscribe to change events for a [`WatchScope`]. They are
//! abstracted behind [`FileSystem`] so the same rescan logic runs against the
//! local disk ([`LocalFileSystem`]) and an in-memory tree
//! ([`MemoryFileSystem`]).

mod local;
mod memory;

pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

use async_trait::async_trait;
use jscad_preview_config::ScriptFilter;
use std::any::Any;
use std::borrow::Cow;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;

/// Type of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Directory,
    SymbolicLink,
    /// Sockets, devices, fifos and anything else
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub size: u64,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name exactly as stored on disk, which need not be UTF-8
    pub name: OsString,
    pub kind: FileKind,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Name for display and suffix matching; invalid UTF-8 is replaced.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Changed,
    Created,
}

/// A change inside a subscribed scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: PathBuf,
}

/// Receiving end of a subscription's events.
pub type EventSink = UnboundedSender<WatchEvent>;

/// What a subscription observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Exactly one file.
    File(PathBuf),
    /// Every recognised script file anywhere under `root`.
    Tree { root: PathBuf, filter: ScriptFilter },
}

impl WatchScope {
    pub fn root(&self) -> &Path {
        match self {
            WatchScope::File(path) => path,
            WatchScope::Tree { root, .. } => root,
        }
    }

    /// Glob equivalent of the scope, for diagnostics.
    pub fn glob(&self) -> String {
        match self {
            WatchScope::File(path) => path.display().to_string(),
            WatchScope::Tree { root, filter } => {
                let root = root.display().to_string();
                let root = root.trim_end_matches('/');
                match filter.extensions() {
                    [ext] => format!("{root}/**/*.{ext}"),
                    exts => format!("{root}/**/*.{{{}}}", exts.join(",")),
                }
            }
        }
    }

    /// Whether an event on `path` belongs to this scope.
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            WatchScope::File(target) => path == target,
            WatchScope::Tree { root, filter } => {
                path != root && path.starts_with(root) && filter.matches_path(path)
            }
        }
    }

    /// Same scope with its path replaced, keeping the filter.
    pub fn with_root(&self, root: PathBuf) -> Self {
        match self {
            WatchScope::File(_) => WatchScope::File(root),
            WatchScope::Tree { filter, .. } => WatchScope::Tree {
                root,
                filter: filter.clone(),
            },
        }
    }
}

/// Handle owning the lifetime of a change subscription.
///
/// `unsubscribe` releases the underlying watcher; calling it again, or
/// dropping the handle afterwards, does nothing.
pub struct Subscription {
    description: String,
    guard: Option<Box<dyn Any + Send>>,
}

impl Subscription {
    pub fn new(description: impl Into<String>, guard: impl Any + Send) -> Self {
        Self {
            description: description.into(),
            guard: Some(Box::new(guard)),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }

    pub fn unsubscribe(&mut self) {
        if let Some(guard) = self.guard.take() {
            drop(guard);
            log::debug!("Unsubscribed from {}", self.description);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("description", &self.description)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Async filesystem backend
#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    /// Type of the entry at `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing exists at `path` (including broken links).
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    async fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// List a directory (non-recursive). Symlinks are reported as
    /// [`FileKind::SymbolicLink`], not resolved.
    async fn read_directory(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Start delivering create/change events for `scope` into `sink`.
    fn subscribe(&self, scope: &WatchScope, sink: EventSink) -> anyhow::Result<Subscription>;
}
