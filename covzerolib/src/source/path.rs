//! Base directory resolution.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::CovzeroError;
use crate::Result;

/// Resolve `path` to an absolute, lexically normalized path.
///
/// Relative paths are joined onto the current directory. `.` components are
/// dropped and `..` removes the previous component. Symlinks are left alone,
/// so the result names the same location the user typed.
pub fn absolute_base(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(CovzeroError::CurrentDir)?
            .join(path)
    };
    Ok(normalize(&joined))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // popping the root is a no-op, matching `/..` == `/`
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_cur_dir() {
        assert_eq!(normalize(Path::new("/a/./b/.")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_normalize_pops_parent_dir() {
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_strips_trailing_separator() {
        assert_eq!(normalize(Path::new("/a/b/")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_absolute_base_keeps_absolute_input() {
        let resolved = absolute_base("/tmp/project/../project").unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/project"));
    }

    #[test]
    fn test_absolute_base_joins_relative_onto_cwd() {
        let cwd = env::current_dir().unwrap();
        let resolved = absolute_base("some/./dir").unwrap();

        assert!(resolved.is_absolute());
        assert_eq!(resolved, normalize(&cwd.join("some/dir")));
    }

    #[test]
    fn test_absolute_base_dot_is_cwd() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(absolute_base(".").unwrap(), normalize(&cwd));
    }
}
