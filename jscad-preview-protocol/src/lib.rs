//! Wire format and message protocol for the jscad-preview host.
//!
//! Everything that crosses a process or surface boundary is defined here as a
//! closed serde type, so adding a message kind is a compile-time-checked
//! change on both ends.
//!
//! # Module layout
//!
//! - [`tree`] - the source tree (`Directory | File`) in its serialized shape
//! - [`message`] - display-surface messages and host events
//! - [`framing`] - newline-delimited JSON reading and writing

pub mod framing;
pub mod message;
pub mod tree;

pub use framing::{FrameError, parse_line, write_line};
pub use message::{HostEvent, InboundMessage, OutboundMessage, Severity};
pub use tree::{DirectoryNode, FileNode, TreeNode, TreeRef};
