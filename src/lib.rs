// Library exports for the binary and the integration tests.
//
// # Locking
//
// Watcher state and display surfaces are guarded by `parking_lot::Mutex`.
// Those locks are never held across an `.await`; rescans run on a spawned
// task and only take the surface lock to post a finished tree.

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod app;
pub mod cli;
pub mod command;
pub mod data_watcher;
pub mod display;
pub mod fs;
pub mod host;
pub mod html;
pub mod session;
pub mod tree_builder;

pub use jscad_preview_config as config;
pub use jscad_preview_protocol as protocol;

pub use data_watcher::{DataWatcher, ScanOptions, WatchError, WatchOptions};
pub use session::{PreviewController, PreviewSession};
pub use tree_builder::{SourceFile, TreeBuilder};
