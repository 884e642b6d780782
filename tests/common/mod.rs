//! Shared integration test helpers for jscad-preview.
//!
//! Include this module at the top of each test file that needs it:
//!
//! ```ignore
//! mod common;
//! use common::{RecordingHost, RecordingNotifier, TreeSink};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a
//! subset of helpers is used per file.

#![allow(dead_code)]

use jscad_preview::config::PreviewConfig;
use jscad_preview::display::{DisplayHost, DisplaySurface, Notifier};
use jscad_preview::protocol::{DirectoryNode, OutboundMessage, Severity};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything a surface was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Post(OutboundMessage),
    Title(String),
    Reveal,
    Dispose,
}

/// Test double recording calls into a log shared with its host.
#[derive(Debug)]
pub struct RecordingSurface {
    pub id: usize,
    log: Arc<Mutex<Vec<(usize, SurfaceCall)>>>,
}

impl RecordingSurface {
    fn record(&self, call: SurfaceCall) {
        self.log.lock().push((self.id, call));
    }
}

impl DisplaySurface for RecordingSurface {
    fn post_message(&mut self, message: &OutboundMessage) -> anyhow::Result<()> {
        self.record(SurfaceCall::Post(message.clone()));
        Ok(())
    }

    fn set_title(&mut self, title: &str) {
        self.record(SurfaceCall::Title(title.to_string()));
    }

    fn reveal(&mut self) {
        self.record(SurfaceCall::Reveal);
    }

    fn dispose(&mut self) {
        self.record(SurfaceCall::Dispose);
    }
}

/// Host creating [`RecordingSurface`]s; clones share the same logs.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// `(title, html)` per created surface
    pub created: Arc<Mutex<Vec<(String, String)>>>,
    pub calls: Arc<Mutex<Vec<(usize, SurfaceCall)>>>,
    pub fail_create: Arc<Mutex<bool>>,
}

impl RecordingHost {
    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// A surface not created through this host, e.g. one being revived.
    pub fn detached_surface(&self, id: usize) -> RecordingSurface {
        RecordingSurface {
            id,
            log: Arc::clone(&self.calls),
        }
    }

    pub fn calls_for(&self, id: usize) -> Vec<SurfaceCall> {
        self.calls
            .lock()
            .iter()
            .filter(|(sid, _)| *sid == id)
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn posts_for(&self, id: usize) -> Vec<OutboundMessage> {
        self.calls_for(id)
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Post(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Root directory carried by the most recent post to surface `id`.
    pub fn last_root(&self, id: usize) -> Option<DirectoryNode> {
        self.posts_for(id)
            .last()
            .and_then(|m| m.roots().first().cloned())
            .and_then(|node| node.as_directory().cloned())
    }
}

impl DisplayHost for RecordingHost {
    type Surface = RecordingSurface;

    fn create_surface(&mut self, title: &str, html: &str) -> anyhow::Result<RecordingSurface> {
        if *self.fail_create.lock() {
            anyhow::bail!("surface creation refused");
        }
        let mut created = self.created.lock();
        created.push((title.to_string(), html.to_string()));
        Ok(RecordingSurface {
            id: created.len() - 1,
            log: Arc::clone(&self.calls),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<(Severity, String)>>>,
}

impl RecordingNotifier {
    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages.lock().push((severity, message.to_string()));
    }
}

/// Config with debouncing off so every injected event rescans immediately.
pub fn test_config() -> PreviewConfig {
    PreviewConfig {
        debounce_ms: 0,
        ..PreviewConfig::default()
    }
}

/// Collects trees delivered by a watcher callback.
pub struct TreeSink {
    rx: mpsc::UnboundedReceiver<DirectoryNode>,
}

impl TreeSink {
    pub fn new() -> (impl Fn(DirectoryNode) + Send + Sync + 'static, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback = move |root| {
            let _ = tx.send(root);
        };
        (callback, Self { rx })
    }

    /// Next delivered tree, failing the test after two seconds.
    pub async fn next(&mut self) -> DirectoryNode {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for a tree")
            .expect("watcher callback dropped")
    }

    /// Assert nothing arrives within a short window.
    pub async fn assert_quiet(&mut self) {
        let result = tokio::time::timeout(Duration::from_millis(100), self.rx.recv()).await;
        assert!(result.is_err(), "unexpected tree: {:?}", result);
    }
}

/// Yield until `condition` holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
