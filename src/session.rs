//! Preview session management.
//!
//! [`PreviewController`] owns at most one live [`PreviewSession`]. The first
//! preview request creates a display surface and a dormant session; the
//! surface's ready signal starts the change watcher; closing the surface
//! tears everything down. Later requests retarget the live session in place
//! instead of opening a second panel.

use crate::command;
use crate::data_watcher::{DataWatcher, ScanOptions, WatchError, WatchOptions};
use crate::display::{DisplayHost, DisplaySurface, Notifier};
use crate::fs::FileSystem;
use crate::html;
use jscad_preview_config::{PreviewConfig, ProtocolVariant};
use jscad_preview_protocol::{InboundMessage, OutboundMessage};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One live preview: a surface, the target it shows, and its watcher.
pub struct PreviewSession<S: DisplaySurface, F: FileSystem> {
    surface: Arc<Mutex<S>>,
    target: PathBuf,
    watcher: DataWatcher<F>,
    /// Set once the surface has signalled ready
    started: bool,
}

impl<S: DisplaySurface, F: FileSystem> PreviewSession<S, F> {
    fn new(surface: S, target: PathBuf, watcher: DataWatcher<F>) -> Self {
        Self {
            surface: Arc::new(Mutex::new(surface)),
            target,
            watcher,
            started: false,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn watcher(&self) -> &DataWatcher<F> {
        &self.watcher
    }

    /// Run `f` against the surface, e.g. to inspect a test double.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.surface.lock())
    }

    async fn start_watching(&mut self, protocol: ProtocolVariant, notifier: &dyn Notifier) {
        self.started = true;
        let surface = Arc::clone(&self.surface);
        let result = self
            .watcher
            .watch(
                &self.target,
                move |root| {
                    let message = match protocol {
                        ProtocolVariant::SetData => OutboundMessage::set_data(root),
                        ProtocolVariant::Update => OutboundMessage::update(root),
                    };
                    if let Err(e) = surface.lock().post_message(&message) {
                        log::warn!("Failed to post tree update: {:#}", e);
                    }
                },
                WatchOptions { emit_initial: true },
            )
            .await;
        if let Err(e) = result {
            report_watch_error(notifier, &e);
        }
    }

    fn dispose(self) {
        self.watcher.dispose();
        self.surface.lock().dispose();
        log::info!("Preview session for {} disposed", self.target.display());
    }
}

fn report_watch_error(notifier: &dyn Notifier, error: &WatchError) {
    match error {
        WatchError::Busy => notifier.warn(&error.to_string()),
        _ => notifier.error(&error.to_string()),
    }
}

/// Registry of the single preview session.
pub struct PreviewController<H: DisplayHost, F: FileSystem> {
    host: H,
    fs: Arc<F>,
    notifier: Arc<dyn Notifier>,
    config: Arc<PreviewConfig>,
    session: Option<PreviewSession<H::Surface, F>>,
}

impl<H: DisplayHost, F: FileSystem> PreviewController<H, F> {
    pub fn new(
        host: H,
        fs: Arc<F>,
        notifier: Arc<dyn Notifier>,
        config: Arc<PreviewConfig>,
    ) -> Self {
        Self {
            host,
            fs,
            notifier,
            config,
            session: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&PreviewSession<H::Surface, F>> {
        self.session.as_ref()
    }

    pub fn current_target(&self) -> Option<&Path> {
        self.session.as_ref().map(PreviewSession::target)
    }

    pub fn title_for(&self, target: &Path) -> String {
        self.config.title_for(target)
    }

    /// Editor command entry: resolve `raw_target` and show it.
    ///
    /// Targets outside the local filesystem are refused before any session
    /// or watcher is touched.
    pub async fn show_preview(&mut self, raw_target: &str) {
        match command::resolve_target(raw_target) {
            Ok(target) => self.create_or_show(target).await,
            Err(e) => {
                log::warn!("Rejected preview target {:?}: {}", raw_target, e);
                self.notifier.error(&e.to_string());
            }
        }
    }

    /// Show `target`, creating the panel if none is open.
    ///
    /// With a live session: a different target retargets it in place, the
    /// same target only brings the panel forward.
    pub async fn create_or_show(&mut self, target: PathBuf) {
        let protocol = self.config.protocol;
        if let Some(session) = self.session.as_mut() {
            if session.target != target {
                let title = self.config.title_for(&target);
                log::info!("Retargeting preview to {}", target.display());
                session.target = target;
                session.surface.lock().set_title(&title);
                // A dormant session picks the new target up on ready
                if session.started {
                    session
                        .start_watching(protocol, self.notifier.as_ref())
                        .await;
                }
            }
            session.surface.lock().reveal();
            return;
        }

        let title = self.config.title_for(&target);
        let document = html::preview_document(
            &title,
            &self.config.viewer_script,
            &self.config.bridge_script,
        );
        match self.host.create_surface(&title, &document) {
            Ok(surface) => {
                log::info!("Opened preview for {}", target.display());
                self.session = Some(PreviewSession::new(surface, target, self.new_watcher()));
            }
            Err(e) => {
                log::error!("Failed to create preview surface: {:#}", e);
                self.notifier.error(&format!("Failed to open preview: {e}"));
            }
        }
    }

    /// Rebind a surface restored from a dehydrated state. Any live session
    /// is replaced; the watcher starts on the surface's ready signal.
    pub fn revive(&mut self, mut surface: H::Surface, target: PathBuf) {
        if let Some(previous) = self.session.take() {
            previous.dispose();
        }
        surface.set_title(&self.config.title_for(&target));
        log::info!("Revived preview for {}", target.display());
        self.session = Some(PreviewSession::new(surface, target, self.new_watcher()));
    }

    /// The surface finished loading: start streaming trees to it.
    pub async fn handle_ready(&mut self) {
        let protocol = self.config.protocol;
        match self.session.as_mut() {
            Some(session) => {
                log::debug!("Surface ready for {}", session.target.display());
                session
                    .start_watching(protocol, self.notifier.as_ref())
                    .await;
            }
            None => log::debug!("Ready signal without a session, ignoring"),
        }
    }

    /// The surface was closed by the user or torn down by the host.
    pub fn handle_surface_disposed(&mut self) {
        if let Some(session) = self.session.take() {
            session.dispose();
        }
    }

    /// Programmatic teardown; same effect as the user closing the panel.
    pub fn close(&mut self) {
        self.handle_surface_disposed();
    }

    pub async fn handle_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Ready => self.handle_ready().await,
            InboundMessage::ShowPreview { target } => self.show_preview(&target).await,
            InboundMessage::ClosePreview => self.handle_surface_disposed(),
            InboundMessage::Unknown => log::debug!("Ignoring unrecognized command"),
        }
    }

    fn new_watcher(&self) -> DataWatcher<F> {
        DataWatcher::new(Arc::clone(&self.fs), ScanOptions::from_config(&self.config))
    }
}
