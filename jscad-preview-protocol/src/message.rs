//! Message unions exchanged with the display surface and the editor host.
//!
//! All three unions are internally tagged so the JSON carries a single
//! discriminant field that the other side can switch on.

use crate::tree::{DirectoryNode, TreeNode};
use serde::{Deserialize, Serialize};

/// A message received by the host: surface signals and editor commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum InboundMessage {
    /// The display surface finished loading and can accept data.
    Ready,
    /// Preview a file or directory (editor command entry).
    ShowPreview {
        /// Local path or `file://` URI.
        target: String,
    },
    /// The user closed the preview panel.
    ClosePreview,
    /// Any command this host does not understand; ignored.
    #[serde(other)]
    Unknown,
}

/// A message posted to the display surface's bridging script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Hand the tree to the viewer's builder.
    SetData { data: Vec<TreeNode> },
    /// Legacy variant: pass the tree directly to the viewer.
    Update { source: Vec<TreeNode> },
}

impl OutboundMessage {
    pub fn set_data(root: DirectoryNode) -> Self {
        OutboundMessage::SetData {
            data: vec![TreeNode::Directory(root)],
        }
    }

    pub fn update(root: DirectoryNode) -> Self {
        OutboundMessage::Update {
            source: vec![TreeNode::Directory(root)],
        }
    }

    /// The tree roots carried by either variant.
    pub fn roots(&self) -> &[TreeNode] {
        match self {
            OutboundMessage::SetData { data } => data,
            OutboundMessage::Update { source } => source,
        }
    }
}

/// Notification severity shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// An event written by the host for the editor: panel lifecycle, viewer
/// messages and user notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    PanelOpened { title: String, html: String },
    PanelRevealed,
    TitleChanged { title: String },
    PanelDisposed,
    PostMessage { message: OutboundMessage },
    Notification { severity: Severity, message: String },
}
