//! Symlink-aware probing and lazy tree construction.
//!
//! `probe` classifies a path without following links first, then follows
//! once to type a link's target. `build_node` materializes directory
//! contents only where the expansion selection says so, which keeps the
//! cost of an unexpanded subtree at a single stat call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::index::Selection;
use super::node::{DirNode, FileNode, Node};

/// Result of probing a path: link-ness of the entry itself plus the
/// resolved classification of its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    /// The entry itself is a symbolic link.
    pub is_link: bool,
    /// The resolved target is a directory.
    pub is_dir: bool,
}

/// Classify `path`, inspecting the entry itself first and following one
/// level of indirection to type a link's target.
///
/// Fails with `io::ErrorKind::NotFound` when the path, or the target of
/// a dangling link, does not exist at inspection time. The caller
/// decides whether that is fatal or just an entry to skip.
pub fn probe(path: &Path) -> io::Result<FsStat> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        let target = fs::metadata(path)?;
        Ok(FsStat {
            is_link: true,
            is_dir: target.is_dir(),
        })
    } else {
        Ok(FsStat {
            is_link: false,
            is_dir: meta.is_dir(),
        })
    }
}

/// Recursively build the node for `path`, materializing directory
/// contents only for directories present in `selection`.
///
/// Entries that vanish or turn unreadable mid-build are skipped rather
/// than aborting the whole build; an expanded directory whose listing
/// fails outright comes back materialized but empty, so the link between
/// selection membership and materialization still holds.
pub fn build_node(path: &Path, selection: &Selection) -> io::Result<Node> {
    let info = probe(path)?;
    let name = base_name(path);

    if !info.is_dir {
        return Ok(Node::File(FileNode {
            path: path.to_path_buf(),
            is_link: info.is_link,
            name,
            ext: file_ext(path),
        }));
    }

    if !selection.contains(path) {
        // Unexpanded: one stat, no listing, no recursion.
        return Ok(Node::Dir(DirNode::stub(
            path.to_path_buf(),
            info.is_link,
            name,
        )));
    }

    let mut files = Vec::new();
    let mut children = Vec::new();
    for entry_path in list_sorted(path) {
        match build_node(&entry_path, selection) {
            Ok(Node::File(file)) => files.push(file),
            Ok(Node::Dir(dir)) => children.push(dir),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry {}: {}", entry_path.display(), e);
            }
        }
    }

    Ok(Node::Dir(DirNode {
        path: path.to_path_buf(),
        is_link: info.is_link,
        name,
        files: Some(files),
        children: Some(children),
    }))
}

/// Base name of a path, falling back to the full path for roots like `/`
/// which have no final component.
fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Extension without the leading dot, empty when there is none. Matches
/// `Path::extension`: `archive.tar.gz` yields `gz`, `.gitignore` yields
/// nothing.
fn file_ext(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Immediate entries of `dir`, sorted by file name so repeated builds of
/// the same selection come out identical. A failed listing yields an
/// empty sequence with a warning instead of an error.
fn list_sorted(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to list directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                tracing::debug!("Skipping entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_probe_classifies_plain_entries() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("notes.txt");
        File::create(&file).unwrap();

        let dir_stat = probe(temp.path()).unwrap();
        assert_eq!(
            dir_stat,
            FsStat {
                is_link: false,
                is_dir: true
            }
        );

        let file_stat = probe(&file).unwrap();
        assert_eq!(
            file_stat,
            FsStat {
                is_link: false,
                is_dir: false
            }
        );
    }

    #[test]
    fn test_probe_missing_path_is_not_found() {
        let temp = tempdir().unwrap();
        let err = probe(&temp.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_types_link_by_target() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let dir = temp.path().join("real_dir");
        let file = temp.path().join("real_file");
        fs::create_dir(&dir).unwrap();
        File::create(&file).unwrap();

        let dir_link = temp.path().join("dir_link");
        let file_link = temp.path().join("file_link");
        symlink(&dir, &dir_link).unwrap();
        symlink(&file, &file_link).unwrap();

        assert_eq!(
            probe(&dir_link).unwrap(),
            FsStat {
                is_link: true,
                is_dir: true
            }
        );
        assert_eq!(
            probe(&file_link).unwrap(),
            FsStat {
                is_link: true,
                is_dir: false
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_dangling_link_is_not_found() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let link = temp.path().join("dangling");
        symlink(temp.path().join("no_such_target"), &link).unwrap();

        let err = probe(&link).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_file_nodes_record_extension() {
        let temp = tempdir().unwrap();
        for name in ["archive.tar.gz", "README", ".gitignore", "main.rs"] {
            File::create(temp.path().join(name)).unwrap();
        }
        let selection = Selection::from([temp.path().to_path_buf()]);

        let root = match build_node(temp.path(), &selection).unwrap() {
            Node::Dir(dir) => dir,
            other => panic!("expected a directory, got {other:?}"),
        };
        let files = root.files.unwrap();
        let exts: Vec<(&str, &str)> = files
            .iter()
            .map(|f| (f.name.as_str(), f.ext.as_str()))
            .collect();

        assert_eq!(
            exts,
            vec![
                (".gitignore", ""),
                ("README", ""),
                ("archive.tar.gz", "gz"),
                ("main.rs", "rs"),
            ]
        );
    }

    #[test]
    fn test_unselected_directory_stays_a_stub() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        File::create(sub.join("hidden_from_build.txt")).unwrap();

        let selection = Selection::from([temp.path().to_path_buf()]);
        let root = match build_node(temp.path(), &selection).unwrap() {
            Node::Dir(dir) => dir,
            other => panic!("expected a directory, got {other:?}"),
        };

        let children = root.children.unwrap();
        assert_eq!(children.len(), 1);
        assert!(!children[0].is_materialized());
        assert_eq!(children[0].path, sub);
    }

    #[test]
    fn test_selected_directory_partitions_and_sorts() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::create_dir(sub.join("beta")).unwrap();
        fs::create_dir(sub.join("alpha")).unwrap();
        File::create(sub.join("zeta.txt")).unwrap();
        File::create(sub.join("eta.txt")).unwrap();

        let selection = Selection::from([temp.path().to_path_buf(), sub.clone()]);
        let root = match build_node(temp.path(), &selection).unwrap() {
            Node::Dir(dir) => dir,
            other => panic!("expected a directory, got {other:?}"),
        };

        let children = root.children.unwrap();
        let sub_node = &children[0];
        assert!(sub_node.is_materialized());

        let file_names: Vec<&str> = sub_node
            .files
            .as_ref()
            .unwrap()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        let child_names: Vec<&str> = sub_node
            .children
            .as_ref()
            .unwrap()
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        assert_eq!(file_names, vec!["eta.txt", "zeta.txt"]);
        assert_eq!(child_names, vec!["alpha", "beta"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_entry_is_skipped() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        File::create(temp.path().join("kept.txt")).unwrap();
        symlink(
            temp.path().join("no_such_target"),
            temp.path().join("dangling"),
        )
        .unwrap();

        let selection = Selection::from([temp.path().to_path_buf()]);
        let root = match build_node(temp.path(), &selection).unwrap() {
            Node::Dir(dir) => dir,
            other => panic!("expected a directory, got {other:?}"),
        };

        let files = root.files.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "kept.txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_expanded_dir_is_materialized_but_empty() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        File::create(locked.join("unreachable.txt")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Mode bits do not bind a privileged user, so there is no
            // denial to exercise here.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let selection = Selection::from([temp.path().to_path_buf(), locked.clone()]);
        let root = match build_node(temp.path(), &selection).unwrap() {
            Node::Dir(dir) => dir,
            other => panic!("expected a directory, got {other:?}"),
        };

        let children = root.children.unwrap();
        let locked_node = &children[0];
        assert_eq!(locked_node.path, locked);
        assert!(locked_node.is_materialized());
        assert_eq!(locked_node.files, Some(Vec::new()));
        assert_eq!(locked_node.children, Some(Vec::new()));

        // Restore so the tempdir can clean up its contents.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
