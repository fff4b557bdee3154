//! Candidate file collection under the watched directories.
//!
//! Every regular file below `bin/`, `node_scripts/`, `src/` and `scripts/`
//! is a candidate, except hidden entries: dot-named files are skipped and
//! dot-named directories (`.venv`, `.tox`, ...) are not descended into.
//! Whether a candidate is actually Python is decided later by
//! [`crate::classify`].

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::CovzeroError;
use crate::Result;

/// Subdirectories of the base directory that are searched for sources.
pub const WATCHED_DIRS: [&str; 4] = ["bin", "node_scripts", "src", "scripts"];

/// Collect every regular file below the watched subdirectories of `base`.
///
/// A watched name that is missing, or is not a directory, contributes
/// nothing. Symlinks are followed; dangling ones are skipped. Any other
/// traversal failure is returned as [`CovzeroError::Walk`].
///
/// The result is sorted by the byte order of the path string and contains
/// no duplicates.
pub fn collect_candidates(base: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let base = base.as_ref();
    let mut files = Vec::new();

    for name in WATCHED_DIRS {
        let root = base.join(name);
        if !root.is_dir() {
            debug!(root = %root.display(), "watched directory absent, skipping");
            continue;
        }
        walk_files(&root, &mut files)?;
    }

    // Path's own Ord compares component-wise; the baseline wants plain
    // string order so `a-b.py` sorts before `a/x.py`.
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    files.dedup();

    Ok(files)
}

fn walk_files(root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    debug!(root = %root.display(), "walking");

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_dangling_symlink(&err) => {
                debug!(path = ?err.path(), "skipping dangling symlink");
                continue;
            }
            Err(err) => {
                return Err(CovzeroError::Walk {
                    path: err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf()),
                    source: err,
                })
            }
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(())
}

fn is_hidden(name: &OsStr) -> bool {
    name.as_encoded_bytes().starts_with(b".")
}

/// With `follow_links`, walkdir reports a link whose target is gone as a
/// NotFound error on the link path itself.
fn is_dangling_symlink(err: &walkdir::Error) -> bool {
    let not_found = err
        .io_error()
        .is_some_and(|io| io.kind() == ErrorKind::NotFound);
    let is_link = err
        .path()
        .and_then(|p| p.symlink_metadata().ok())
        .is_some_and(|meta| meta.file_type().is_symlink());
    not_found && is_link
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(base: &Path, rel: &str) {
        let path = base.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relative(files: &[PathBuf], base: &Path) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_collects_from_all_watched_dirs() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "bin/tool");
        touch(temp.path(), "node_scripts/hook.py");
        touch(temp.path(), "src/pkg/mod.py");
        touch(temp.path(), "scripts/run.sh");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(
            relative(&files, temp.path()),
            vec!["bin/tool", "node_scripts/hook.py", "scripts/run.sh", "src/pkg/mod.py"]
        );
    }

    #[test]
    fn test_ignores_files_outside_watched_dirs() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "setup.py");
        touch(temp.path(), "lib/other.py");
        touch(temp.path(), "tests/test_a.py");
        touch(temp.path(), "src/a.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(relative(&files, temp.path()), vec!["src/a.py"]);
    }

    #[test]
    fn test_missing_watched_dirs_are_not_errors() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/a.py");

        let files = collect_candidates(temp.path()).unwrap();
        assert_eq!(files.len(), 1);

        let empty = tempdir().unwrap();
        assert!(collect_candidates(empty.path()).unwrap().is_empty());
    }

    #[test]
    fn test_watched_name_that_is_a_file_contributes_nothing() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "bin");
        touch(temp.path(), "src/a.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(relative(&files, temp.path()), vec!["src/a.py"]);
    }

    #[test]
    fn test_skips_hidden_entries() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/a.py");
        touch(temp.path(), "src/.b.py");
        touch(temp.path(), "src/.venv/lib/site.py");
        touch(temp.path(), "src/pkg/.tox/x.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(relative(&files, temp.path()), vec!["src/a.py"]);
    }

    #[test]
    fn test_walks_deep_nesting() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/x/y/z/deep.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(relative(&files, temp.path()), vec!["src/x/y/z/deep.py"]);
    }

    #[test]
    fn test_excludes_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/empty.py")).unwrap();

        let files = collect_candidates(temp.path()).unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn test_sorted_by_string_not_components() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/a/x.py");
        touch(temp.path(), "src/a-b.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(
            relative(&files, temp.path()),
            vec!["src/a-b.py", "src/a/x.py"]
        );
    }

    #[test]
    fn test_paths_are_rooted_at_base() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "scripts/s.py");

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(files, vec![temp.path().join("scripts/s.py")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinks_and_skips_dangling() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        touch(temp.path(), "real/target.py");
        fs::create_dir_all(temp.path().join("src")).unwrap();
        symlink(temp.path().join("real"), temp.path().join("src/linked")).unwrap();
        symlink(
            temp.path().join("real/target.py"),
            temp.path().join("src/alias.py"),
        )
        .unwrap();
        symlink(temp.path().join("gone.py"), temp.path().join("src/broken.py")).unwrap();

        let files = collect_candidates(temp.path()).unwrap();

        assert_eq!(
            relative(&files, temp.path()),
            vec!["src/alias.py", "src/linked/target.py"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_fatal() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        touch(temp.path(), "src/a.py");
        symlink(temp.path().join("src"), temp.path().join("src/loop")).unwrap();

        let result = collect_candidates(temp.path());

        match result {
            Err(CovzeroError::Walk { path, source }) => {
                assert!(path.starts_with(temp.path().join("src/loop")));
                assert!(source.loop_ancestor().is_some());
            }
            other => panic!("Expected Walk error, got {other:?}"),
        }
    }
}
