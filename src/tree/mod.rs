//! Lazily-materialized mirror of a directory tree.
//!
//! This module provides:
//! - `node`: the `File`/`Dir` sum type with the unexpanded-stub sentinel
//! - `build`: symlink-aware probing and selection-driven construction
//! - `index`: `TreeIndex`, pairing a selection with the tree built from it
//! - `display`: panel labels for mirrored paths

pub mod build;
pub mod display;
pub mod index;
pub mod node;

pub use build::{build_node, probe, FsStat};
pub use display::display_name;
pub use index::{Selection, TreeError, TreeIndex};
pub use node::{DirNode, FileNode, Node};
