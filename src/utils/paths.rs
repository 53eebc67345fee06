// Path display helpers

use std::path::{Component, Path, PathBuf};
use tracing::error;

use crate::error::PathError;

/// Path utilities for user-facing output
pub struct PathUtils;

impl PathUtils {
    /// Express `path` relative to `root`.
    ///
    /// Relative inputs are taken as already relative to `root`. A path that
    /// is not under `root` means the root was configured wrongly; the error
    /// is logged and returned for the caller to escalate.
    pub fn relativize(path: &Path, root: &Path) -> Result<PathBuf, PathError> {
        if path.is_relative() {
            return Ok(Self::normalize(path));
        }
        let path = Self::normalize(path);
        let root = Self::normalize(root);
        match path.strip_prefix(&root) {
            Ok(rel) => Ok(rel.to_path_buf()),
            Err(_) => {
                let err = PathError { path, root };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Whether `path` lies under `root`; relative paths always do
    pub fn is_under(path: &Path, root: &Path) -> bool {
        path.is_relative() || Self::normalize(path).starts_with(Self::normalize(root))
    }

    /// Relative form when possible, the path as given otherwise
    pub fn display(path: &Path, root: &Path) -> String {
        let normalized = Self::normalize(path);
        let root = Self::normalize(root);
        normalized
            .strip_prefix(&root)
            .unwrap_or(&normalized)
            .display()
            .to_string()
    }

    /// Absolute form of `path`, resolving relative paths against `root`
    pub fn absolute(path: &Path, root: &Path) -> PathBuf {
        if path.is_absolute() {
            Self::normalize(path)
        } else {
            Self::normalize(&root.join(path))
        }
    }

    /// Drop `.` components and fold `..` without touching the filesystem
    pub fn normalize(path: &Path) -> PathBuf {
        let mut out = PathBuf::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !out.pop() {
                        out.push("..");
                    }
                }
                other => out.push(other.as_os_str()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relativize_under_root() {
        let rel = PathUtils::relativize(
            Path::new("/srv/project/tests/test_a.py"),
            Path::new("/srv/project"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("tests/test_a.py"));
    }

    #[test]
    fn test_relativize_outside_root_fails() {
        let err = PathUtils::relativize(Path::new("/usr/lib/x.py"), Path::new("/srv/project"))
            .unwrap_err();
        assert_eq!(err.path, PathBuf::from("/usr/lib/x.py"));
    }

    #[test]
    fn test_is_under() {
        let root = Path::new("/srv/project");
        assert!(PathUtils::is_under(Path::new("/srv/project/tests/a.py"), root));
        assert!(PathUtils::is_under(Path::new("tests/a.py"), root));
        assert!(!PathUtils::is_under(Path::new("/srv/project-old/a.py"), root));
        assert!(!PathUtils::is_under(Path::new("/usr/lib/python3.12/json/decoder.py"), root));
    }

    #[test]
    fn test_relativize_normalizes() {
        let rel = PathUtils::relativize(
            Path::new("/srv/project/./tests/../src/mod.py"),
            Path::new("/srv/project/"),
        )
        .unwrap();
        assert_eq!(rel, PathBuf::from("src/mod.py"));
        assert_eq!(
            PathUtils::relativize(Path::new("./tests/a.py"), Path::new("/srv")).unwrap(),
            PathBuf::from("tests/a.py")
        );
    }

    #[test]
    fn test_display_falls_back() {
        assert_eq!(
            PathUtils::display(Path::new("/usr/lib/x.py"), Path::new("/srv/project")),
            "/usr/lib/x.py"
        );
        assert_eq!(
            PathUtils::display(Path::new("/srv/project/a.py"), Path::new("/srv/project")),
            "a.py"
        );
    }
}
