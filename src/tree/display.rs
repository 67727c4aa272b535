//! Panel labels for mirrored paths.

use std::path::{Path, MAIN_SEPARATOR};

/// Label for `path` in a panel rooted at `tree_root`.
///
/// The label is the path relative to the root with control characters
/// escaped, plus a trailing separator when the path is a directory on
/// disk. Paths outside the root render in full; the root itself renders
/// as `.` plus the separator.
pub fn display_name(path: &Path, tree_root: &Path) -> String {
    let rel = path.strip_prefix(tree_root).unwrap_or(path);
    let raw = if rel.as_os_str().is_empty() {
        ".".into()
    } else {
        rel.to_string_lossy()
    };

    let mut name = String::with_capacity(raw.len() + 1);
    for c in raw.chars() {
        if c.is_control() {
            name.extend(c.escape_debug());
        } else {
            name.push(c);
        }
    }
    if path.is_dir() {
        name.push(MAIN_SEPARATOR);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_files_render_relative_to_root() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("src").join("main.rs");
        fs::create_dir(temp.path().join("src")).unwrap();
        File::create(&nested).unwrap();

        let label = display_name(&nested, temp.path());
        assert_eq!(label, format!("src{}main.rs", MAIN_SEPARATOR));
    }

    #[test]
    fn test_directories_get_a_trailing_separator() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();

        assert_eq!(display_name(&sub, temp.path()), format!("sub{}", MAIN_SEPARATOR));
    }

    #[test]
    fn test_root_renders_as_dot() {
        let temp = tempdir().unwrap();
        assert_eq!(
            display_name(temp.path(), temp.path()),
            format!(".{}", MAIN_SEPARATOR)
        );
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let temp = tempdir().unwrap();
        let odd = temp.path().join("a\nb");

        // Not on disk, so no trailing separator either.
        assert_eq!(display_name(&odd, temp.path()), "a\\nb");
    }

    #[test]
    fn test_paths_outside_the_root_render_in_full() {
        let temp = tempdir().unwrap();
        let elsewhere = Path::new("/somewhere/else.txt");

        assert_eq!(display_name(elsewhere, temp.path()), "/somewhere/else.txt");
    }
}
