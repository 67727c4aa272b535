//! Selection-driven tree index.
//!
//! This module pairs the set of user-expanded directories with the tree
//! materialized from it. Rebuilding from scratch is the only way the
//! tree changes shape; a materialized tree is never patched in place.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::build::build_node;
use super::node::{DirNode, Node};

/// Set of directory paths the user has expanded in the panel.
pub type Selection = HashSet<PathBuf>;

/// Errors fatal to a rebuild. The caller keeps its previous index when
/// one of these surfaces.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The root path exists but is not a directory.
    #[error("tree root {path} is not a directory")]
    RootNotDirectory {
        /// The rejected root path.
        path: PathBuf,
    },

    /// The root path could not be probed at all.
    #[error("failed to probe tree root {path}: {source}")]
    RootUnreadable {
        /// The rejected root path.
        path: PathBuf,
        /// The underlying filesystem error.
        source: io::Error,
    },
}

/// The mirrored tree: an expansion selection plus the root built from it.
///
/// Two invariants hold immediately after every rebuild:
/// - the root path is a member of the selection (a panel with a
///   collapsed root would have nothing to show);
/// - every directory reachable from the root is materialized exactly
///   when its path is in the selection.
#[derive(Debug, Clone)]
pub struct TreeIndex {
    selection: Selection,
    root: DirNode,
}

impl TreeIndex {
    /// Build a fresh index rooted at `root_path`, materializing exactly
    /// the directories in `selection` plus the root itself.
    pub fn rebuild(root_path: &Path, mut selection: Selection) -> Result<Self, TreeError> {
        selection.insert(root_path.to_path_buf());
        match build_node(root_path, &selection) {
            Ok(Node::Dir(root)) => Ok(Self { selection, root }),
            Ok(Node::File(_)) => Err(TreeError::RootNotDirectory {
                path: root_path.to_path_buf(),
            }),
            Err(source) => Err(TreeError::RootUnreadable {
                path: root_path.to_path_buf(),
                source,
            }),
        }
    }

    /// The materialized root directory.
    pub fn root(&self) -> &DirNode {
        &self.root
    }

    /// The expansion selection this tree was built from.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether `path` is currently expanded.
    pub fn is_expanded(&self, path: &Path) -> bool {
        self.selection.contains(path)
    }

    /// A new index with `path` added to the selection. Expanding an
    /// already-expanded path is a no-op clone; otherwise the whole tree
    /// is rebuilt against the grown selection.
    pub fn expanded(&self, path: &Path) -> Result<Self, TreeError> {
        if self.selection.contains(path) {
            return Ok(self.clone());
        }
        let mut selection = self.selection.clone();
        selection.insert(path.to_path_buf());
        Self::rebuild(&self.root.path, selection)
    }

    /// A new index with `path` removed from the selection, with the same
    /// no-op and rebuild semantics as [`TreeIndex::expanded`]. Collapsing
    /// the root is ineffective since the rebuild re-inserts it.
    pub fn collapsed(&self, path: &Path) -> Result<Self, TreeError> {
        if !self.selection.contains(path) {
            return Ok(self.clone());
        }
        let mut selection = self.selection.clone();
        selection.remove(path);
        Self::rebuild(&self.root.path, selection)
    }
}
