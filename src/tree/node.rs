//! Filesystem node model for the mirrored tree.
//!
//! This module provides the `Node` sum type with its `File` and `Dir`
//! variants. A `Dir` either carries materialized contents (`files` and
//! `children` both present) or is an unexpanded stub (both absent); no
//! mixed state exists.

use std::path::{Path, PathBuf};

/// A single entry in the mirrored tree, classified by its resolved type.
///
/// Symbolic links are classified by what they point at: a link to a
/// directory is a `Dir`, a link to a regular file is a `File`. The
/// `is_link` flag on the variant records that the entry itself is a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A regular file, or a symlink resolving to one.
    File(FileNode),
    /// A directory, or a symlink resolving to one.
    Dir(DirNode),
}

impl Node {
    /// Absolute path of the underlying entry.
    pub fn path(&self) -> &Path {
        match self {
            Node::File(file) => &file.path,
            Node::Dir(dir) => &dir.path,
        }
    }

    /// Base name of the entry.
    pub fn name(&self) -> &str {
        match self {
            Node::File(file) => &file.name,
            Node::Dir(dir) => &dir.name,
        }
    }

    /// Whether the entry itself is a symbolic link.
    pub fn is_link(&self) -> bool {
        match self {
            Node::File(file) => file.is_link,
            Node::Dir(dir) => dir.is_link,
        }
    }
}

/// A file entry in the mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Absolute path; unique key within the tree.
    pub path: PathBuf,
    /// Whether the entry itself is a symlink (resolving to a file).
    pub is_link: bool,
    /// Base name.
    pub name: String,
    /// Extension without the leading dot; empty when the name has none.
    /// Leading-dot names such as `.gitignore` have no extension.
    pub ext: String,
}

/// A directory entry in the mirror, materialized or an unexpanded stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    /// Absolute path; unique key within the tree.
    pub path: PathBuf,
    /// Whether the entry itself is a symlink (resolving to a directory).
    pub is_link: bool,
    /// Base name.
    pub name: String,
    /// Files directly inside this directory, unique by path, sorted by
    /// name. `None` until the directory is expanded.
    pub files: Option<Vec<FileNode>>,
    /// Subdirectories directly inside this directory, unique by path,
    /// sorted by name. `None` until the directory is expanded.
    pub children: Option<Vec<DirNode>>,
}

impl DirNode {
    /// Create an unexpanded stub: no contents materialized, no directory
    /// listing performed.
    pub fn stub(path: PathBuf, is_link: bool, name: String) -> Self {
        Self {
            path,
            is_link,
            name,
            files: None,
            children: None,
        }
    }

    /// Whether this directory's contents have been materialized.
    pub fn is_materialized(&self) -> bool {
        // files and children are present or absent together.
        debug_assert_eq!(self.files.is_some(), self.children.is_some());
        self.files.is_some()
    }
}
