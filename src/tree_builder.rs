//! Converts a flat list of scanned script files into the rooted source tree.
//!
//! Every path is walked segment by segment from a synthetic root. Intermediate
//! segments become directories, created the first time they are seen; the
//! final segment becomes a file when it carries a recognised script suffix.
//! A path can never be both a file and a directory: an entry that would
//! descend through a file, or put a file where a directory already is, is
//! skipped and reported.

use jscad_preview_config::{PreviewConfig, ScriptFilter};
use jscad_preview_protocol::{DirectoryNode, FileNode, TreeNode};
use thiserror::Error;

/// One scanned file, its path relative to the watch root (`/`-separated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub relative_path: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(relative_path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: source.into(),
        }
    }
}

/// Why an input entry was left out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeConflict {
    #[error("path {relative_path:?} has no segments")]
    EmptyPath { relative_path: String },

    #[error("{relative_path:?} descends through file {file_path}")]
    ThroughFile {
        relative_path: String,
        file_path: String,
    },

    #[error("{relative_path:?} names existing directory {dir_path} as a file")]
    FileOverDirectory {
        relative_path: String,
        dir_path: String,
    },
}

#[derive(Debug, Clone)]
pub struct TreeBuilder {
    filter: ScriptFilter,
    root_segment: String,
}

impl TreeBuilder {
    pub fn new(filter: ScriptFilter, root_segment: impl Into<String>) -> Self {
        Self {
            filter,
            root_segment: root_segment.into(),
        }
    }

    pub fn from_config(config: &PreviewConfig) -> Self {
        Self::new(config.script_filter(), config.root_segment.clone())
    }

    pub fn root_path(&self) -> String {
        format!("/{}", self.root_segment)
    }

    /// Build the tree, skipping (and logging) conflicting entries.
    pub fn build<I>(&self, files: I) -> DirectoryNode
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let (root, conflicts) = self.build_checked(files);
        for conflict in &conflicts {
            log::warn!("Skipping source file: {conflict}");
        }
        root
    }

    /// Build the tree and return the skipped entries alongside it.
    pub fn build_checked<I>(&self, files: I) -> (DirectoryNode, Vec<TreeConflict>)
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let mut root = DirectoryNode::new(self.root_path(), self.root_segment.clone());
        let mut conflicts = Vec::new();
        for file in files {
            if let Err(conflict) = self.insert(&mut root, file) {
                conflicts.push(conflict);
            }
        }
        (root, conflicts)
    }

    fn insert(&self, root: &mut DirectoryNode, file: SourceFile) -> Result<(), TreeConflict> {
        let SourceFile {
            relative_path,
            source,
        } = file;

        // Consecutive separators and `.` segments carry no structure
        let segments: Vec<&str> = relative_path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(TreeConflict::EmptyPath {
                relative_path: relative_path.clone(),
            });
        };

        let mut mount = root;
        for segment in parents {
            let full_path = format!("{}/{}", mount.full_path, segment);
            mount = descend(mount, full_path, segment, &relative_path)?;
        }

        let full_path = format!("{}/{}", mount.full_path, last);
        match self.filter.extension_of(last) {
            Some(ext) => place_file(mount, full_path, last, ext, source, &relative_path),
            // Non-script leaves are plain directories
            None => descend(mount, full_path, last, &relative_path).map(|_| ()),
        }
    }
}

/// Find or create the directory `full_path` under `mount`.
fn descend<'a>(
    mount: &'a mut DirectoryNode,
    full_path: String,
    name: &str,
    relative_path: &str,
) -> Result<&'a mut DirectoryNode, TreeConflict> {
    let index = match mount
        .children
        .iter()
        .position(|c| c.full_path() == full_path)
    {
        Some(index) => index,
        None => {
            mount
                .children
                .push(TreeNode::Directory(DirectoryNode::new(full_path, name)));
            mount.children.len() - 1
        }
    };
    match &mut mount.children[index] {
        TreeNode::Directory(dir) => Ok(dir),
        TreeNode::File(file) => Err(TreeConflict::ThroughFile {
            relative_path: relative_path.to_string(),
            file_path: file.full_path.clone(),
        }),
    }
}

fn place_file(
    mount: &mut DirectoryNode,
    full_path: String,
    name: &str,
    ext: &str,
    source: String,
    relative_path: &str,
) -> Result<(), TreeConflict> {
    match mount.child_mut(&full_path) {
        Some(TreeNode::File(existing)) => {
            // Same file listed twice: latest content wins, position is kept
            existing.source = source;
            Ok(())
        }
        Some(TreeNode::Directory(dir)) => Err(TreeConflict::FileOverDirectory {
            relative_path: relative_path.to_string(),
            dir_path: dir.full_path.clone(),
        }),
        None => {
            mount.children.push(TreeNode::File(FileNode {
                full_path,
                name: name.to_string(),
                ext: ext.to_string(),
                source,
            }));
            Ok(())
        }
    }
}
