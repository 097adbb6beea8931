use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// The working directory, captured once at startup.
pub static WORKING_DIRECTORY: LazyLock<PathBuf> =
    LazyLock::new(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

/// Recursively searches `dir` for a file with the given name.
pub fn find_file_in(dir: &Path, name: &str) -> Option<PathBuf> {
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_in(&path, name) {
                return Some(found);
            }
        } else if entry.file_name().to_string_lossy() == name {
            return Some(path);
        }
    }
    None
}

/// Searches the working directory tree for a file with the given name.
/// Returns an absolute path, or `None` if no such file exists.
pub fn find_file_named(name: &str) -> Option<PathBuf> {
    let found = find_file_in(&WORKING_DIRECTORY, name)?;
    found.canonicalize().ok().or(Some(found))
}

/// Creates the directory and any missing parents.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/mtdiag_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_find_file_in_nested_dirs() {
        let dir = test_dir("paths_nested");
        fs::create_dir_all(dir.join("a/b")).unwrap();
        fs::write(dir.join("a/b/needle.txt"), "x").unwrap();

        let found = find_file_in(&dir, "needle.txt").unwrap();
        assert!(found.ends_with("a/b/needle.txt"));
        assert!(find_file_in(&dir, "missing.txt").is_none());
    }

    #[test]
    fn test_find_file_in_missing_dir() {
        let dir = test_dir("paths_missing");
        assert!(find_file_in(&dir, "anything").is_none());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = test_dir("paths_ensure");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
