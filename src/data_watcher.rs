//! Change watcher: keeps one filesystem subscription for one target and
//! rebuilds the whole source tree on every change.
//!
//! Lifecycle: idle → busy (stat + subscribe in progress) → watching → idle
//! (disposed). A second `watch` while the first is still setting up is
//! rejected with [`WatchError::Busy`] instead of being queued, because setup
//! awaits several storage calls and must not interleave with a teardown.
//!
//! Rescans are never incremental: each event re-reads every matching file
//! and builds a fresh tree. They run one at a time on a single task, so an
//! event arriving mid-scan is handled after the current scan finishes.

use crate::fs::{FileKind, FileSystem, Subscription, WatchEvent, WatchScope};
use crate::tree_builder::{SourceFile, TreeBuilder};
use anyhow::{Context, Result};
use jscad_preview_config::{PreviewConfig, ScriptFilter};
use jscad_preview_protocol::DirectoryNode;
use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Callback receiving every rebuilt tree.
pub type UpdateCallback = Arc<dyn Fn(DirectoryNode) + Send + Sync>;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Data watcher is busy, please try again later")]
    Busy,

    #[error("Unknown file type: {path}")]
    UnknownFileType { path: String },

    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to watch {path}: {reason}")]
    Subscribe { path: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

/// The path a watcher is bound to and what it turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
}

impl WatchTarget {
    fn scope(&self, filter: &ScriptFilter) -> WatchScope {
        match self.kind {
            TargetKind::File => WatchScope::File(self.path.clone()),
            TargetKind::Directory => WatchScope::Tree {
                root: self.path.clone(),
                filter: filter.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Rescan and call back right after subscribing, before any event.
    pub emit_initial: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self { emit_initial: true }
    }
}

/// Settings shared by every rescan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub filter: ScriptFilter,
    /// Name a single-file target is mounted under
    pub single_file_name: String,
    pub root_segment: String,
    /// Window for coalescing bursts of events into one rescan
    pub debounce: Duration,
}

impl ScanOptions {
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            filter: config.script_filter(),
            single_file_name: config.single_file_name.clone(),
            root_segment: config.root_segment.clone(),
            debounce: Duration::from_millis(config.debounce_ms),
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_config(&PreviewConfig::default())
    }
}

#[derive(Default)]
struct WatcherState {
    busy: bool,
    target: Option<WatchTarget>,
    subscription: Option<Subscription>,
    task: Option<JoinHandle<()>>,
}

/// Clears the busy flag when setup finishes, fails, or is dropped mid-way.
struct BusyGuard {
    state: Arc<Mutex<WatcherState>>,
}

impl BusyGuard {
    fn acquire(state: &Arc<Mutex<WatcherState>>) -> Result<Self, WatchError> {
        let mut guard = state.lock();
        if guard.busy {
            return Err(WatchError::Busy);
        }
        guard.busy = true;
        Ok(Self {
            state: Arc::clone(state),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.lock().busy = false;
    }
}

pub struct DataWatcher<F: FileSystem> {
    fs: Arc<F>,
    options: ScanOptions,
    state: Arc<Mutex<WatcherState>>,
}

impl<F: FileSystem> std::fmt::Debug for DataWatcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DataWatcher")
            .field("busy", &state.busy)
            .field("target", &state.target)
            .finish_non_exhaustive()
    }
}

impl<F: FileSystem> DataWatcher<F> {
    pub fn new(fs: Arc<F>, options: ScanOptions) -> Self {
        Self {
            fs,
            options,
            state: Arc::new(Mutex::new(WatcherState::default())),
        }
    }

    /// Bind to `target`, replacing any previous subscription, and call
    /// `on_update` with a fresh tree after every change.
    ///
    /// # Errors
    ///
    /// - [`WatchError::Busy`] if another `watch` is still setting up; the
    ///   existing state is left untouched.
    /// - [`WatchError::UnknownFileType`] if `target` is missing or neither a
    ///   file nor a directory; no subscription is created.
    pub async fn watch<C>(
        &self,
        target: &Path,
        on_update: C,
        options: WatchOptions,
    ) -> Result<(), WatchError>
    where
        C: Fn(DirectoryNode) + Send + Sync + 'static,
    {
        let _busy = BusyGuard::acquire(&self.state)?;
        self.dispose();

        let kind = classify(self.fs.as_ref(), target).await?;
        let watch_target = WatchTarget {
            path: target.to_path_buf(),
            kind,
        };
        let scope = watch_target.scope(&self.options.filter);

        let (sink, events) = mpsc::unbounded_channel();
        let subscription = self
            .fs
            .subscribe(&scope, sink)
            .map_err(|e| WatchError::Subscribe {
                path: target.display().to_string(),
                reason: format!("{e:#}"),
            })?;
        log::info!("Watching {}", scope.glob());

        let scanner = Scanner {
            fs: Arc::clone(&self.fs),
            target: watch_target.clone(),
            options: self.options.clone(),
        };
        let task = tokio::spawn(rescan_loop(
            scanner,
            events,
            Arc::new(on_update),
            options.emit_initial,
        ));

        let mut state = self.state.lock();
        state.target = Some(watch_target);
        state.subscription = Some(subscription);
        state.task = Some(task);
        Ok(())
    }

    /// Release the subscription and stop rescanning. Safe to call at any
    /// time, any number of times.
    pub fn dispose(&self) {
        let mut state = self.state.lock();
        if let Some(mut subscription) = state.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(task) = state.task.take() {
            task.abort();
        }
        if let Some(target) = state.target.take() {
            log::debug!("Stopped watching {}", target.path.display());
        }
    }

    /// One rescan of `target` without subscribing.
    pub async fn scan_once(&self, target: &Path) -> Result<DirectoryNode> {
        let kind = classify(self.fs.as_ref(), target).await?;
        let scanner = Scanner {
            fs: Arc::clone(&self.fs),
            target: WatchTarget {
                path: target.to_path_buf(),
                kind,
            },
            options: self.options.clone(),
        };
        scanner.rescan().await
    }

    pub fn target(&self) -> Option<WatchTarget> {
        self.state.lock().target.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn is_watching(&self) -> bool {
        self.state
            .lock()
            .subscription
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }
}

impl<F: FileSystem> Drop for DataWatcher<F> {
    fn drop(&mut self) {
        self.dispose();
    }
}

async fn classify<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<TargetKind, WatchError> {
    match fs.stat(path).await {
        Ok(stat) => match stat.kind {
            FileKind::File => Ok(TargetKind::File),
            FileKind::Directory => Ok(TargetKind::Directory),
            FileKind::SymbolicLink | FileKind::Unknown => Err(WatchError::UnknownFileType {
                path: path.display().to_string(),
            }),
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(WatchError::UnknownFileType {
            path: path.display().to_string(),
        }),
        Err(e) => Err(WatchError::Stat {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

async fn rescan_loop<F: FileSystem>(
    scanner: Scanner<F>,
    mut events: UnboundedReceiver<WatchEvent>,
    on_update: UpdateCallback,
    emit_initial: bool,
) {
    if emit_initial {
        scanner.emit(&on_update).await;
    }

    while let Some(event) = events.recv().await {
        log::debug!(
            "{:?} {} -> rescanning {}",
            event.kind,
            event.path.display(),
            scanner.target.path.display()
        );
        let debounce = scanner.options.debounce;
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
            let mut coalesced = 0usize;
            while events.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                log::trace!("Coalesced {} further events into one rescan", coalesced);
            }
        }
        scanner.emit(&on_update).await;
    }
    log::debug!("Event stream for {} closed", scanner.target.path.display());
}

struct Scanner<F: FileSystem> {
    fs: Arc<F>,
    target: WatchTarget,
    options: ScanOptions,
}

impl<F: FileSystem> Scanner<F> {
    async fn emit(&self, on_update: &UpdateCallback) {
        match self.rescan().await {
            Ok(tree) => {
                log::debug!(
                    "Rescanned {}: {} files",
                    self.target.path.display(),
                    tree.file_count()
                );
                on_update(tree);
            }
            // The previously delivered tree stays current; the next event retries
            Err(e) => log::warn!("Rescan of {} failed: {:#}", self.target.path.display(), e),
        }
    }

    async fn rescan(&self) -> Result<DirectoryNode> {
        let files = match self.target.kind {
            TargetKind::File => {
                let bytes = self
                    .fs
                    .read_file(&self.target.path)
                    .await
                    .with_context(|| format!("Failed to read {}", self.target.path.display()))?;
                vec![SourceFile::new(
                    self.options.single_file_name.clone(),
                    decode(bytes),
                )]
            }
            TargetKind::Directory => self.collect_directory().await?,
        };
        let builder = TreeBuilder::new(
            self.options.filter.clone(),
            self.options.root_segment.clone(),
        );
        Ok(builder.build(files))
    }

    /// Breadth-first walk of the target directory, one level at a time.
    async fn collect_directory(&self) -> Result<Vec<SourceFile>> {
        let root = &self.target.path;
        let mut files = Vec::new();
        let mut level = vec![root.clone()];

        while !level.is_empty() {
            let mut next_level = Vec::new();
            for dir in &level {
                let entries = self
                    .fs
                    .read_directory(dir)
                    .await
                    .with_context(|| format!("Failed to list {}", dir.display()))?;
                for entry in entries {
                    let path = dir.join(&entry.name);
                    match entry.kind {
                        FileKind::Directory => next_level.push(path),
                        FileKind::File if self.options.filter.matches(&entry.display_name()) => {
                            let bytes = self
                                .fs
                                .read_file(&path)
                                .await
                                .with_context(|| format!("Failed to read {}", path.display()))?;
                            files.push(SourceFile::new(relative_path(root, &path), decode(bytes)));
                        }
                        _ => {}
                    }
                }
            }
            level = next_level;
        }
        Ok(files)
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// `/`-separated path of `path` relative to `root`.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
