//! The source tree handed to the viewer.
//!
//! Serialized shape, mirrored exactly by the viewer:
//! directories are `{fullPath, name, children}`, files are
//! `{fullPath, name, ext, source}`.

use serde::{Deserialize, Serialize};

/// A node of the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Directory(DirectoryNode),
    File(FileNode),
}

impl TreeNode {
    pub fn full_path(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.full_path,
            TreeNode::File(file) => &file.full_path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.name,
            TreeNode::File(file) => &file.name,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            TreeNode::Directory(dir) => Some(dir),
            TreeNode::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            TreeNode::File(file) => Some(file),
            TreeNode::Directory(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryNode {
    pub full_path: String,
    pub name: String,
    /// First-encounter order of the scan that built this directory
    pub children: Vec<TreeNode>,
}

impl DirectoryNode {
    pub fn new(full_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Direct child with the given full path.
    pub fn child(&self, full_path: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.full_path() == full_path)
    }

    pub fn child_mut(&mut self, full_path: &str) -> Option<&mut TreeNode> {
        self.children.iter_mut().find(|c| c.full_path() == full_path)
    }

    /// Depth-first lookup of any descendant (or self) by full path.
    pub fn find(&self, full_path: &str) -> Option<TreeRef<'_>> {
        if self.full_path == full_path {
            return Some(TreeRef::Directory(self));
        }
        for child in &self.children {
            match child {
                TreeNode::File(file) if file.full_path == full_path => {
                    return Some(TreeRef::File(file));
                }
                TreeNode::Directory(dir) => {
                    if let Some(found) = dir.find(full_path) {
                        return Some(found);
                    }
                }
                TreeNode::File(_) => {}
            }
        }
        None
    }

    /// Number of file nodes in this subtree.
    pub fn file_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                TreeNode::File(_) => 1,
                TreeNode::Directory(dir) => dir.file_count(),
            })
            .sum()
    }

    /// Number of directory nodes in this subtree, this one included.
    pub fn directory_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .filter_map(TreeNode::as_directory)
            .map(DirectoryNode::directory_count)
            .sum::<usize>()
    }
}

/// Borrowed view of a node found by [`DirectoryNode::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRef<'a> {
    Directory(&'a DirectoryNode),
    File(&'a FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub full_path: String,
    pub name: String,
    pub ext: String,
    pub source: String,
}
