/*!
 * Lazy directory traversal producing upload candidates
 */

use glob::Pattern as GlobPattern;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, WebinatorError};

/// File names that are never uploaded, matched at any depth
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".DS_Store"];

/// Set of compiled file-name patterns to skip
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<GlobPattern>,
}

impl IgnoreSet {
    /// Compile a list of glob patterns
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                GlobPattern::new(p.as_ref()).map_err(|e| {
                    WebinatorError::Config(format!(
                        "Invalid ignore pattern '{}': {}",
                        p.as_ref(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Default set: platform metadata files
    pub fn platform_defaults() -> Self {
        // Literal patterns always compile
        Self::new(DEFAULT_IGNORE_PATTERNS).unwrap_or_default()
    }

    /// Check a bare file name against the set
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(file_name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// A file discovered under the sync root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Object key: path relative to the root, `/`-separated
    pub key: String,
}

/// Walks a resolved root directory and yields [`FileEntry`] values
///
/// The root is canonicalized once on construction. Each call to
/// [`TreeWalker::iter`] starts a fresh traversal.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    ignore: IgnoreSet,
}

impl TreeWalker {
    pub fn new(root: &Path, ignore: IgnoreSet) -> Result<Self> {
        let root = fs::canonicalize(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WebinatorError::SourceNotFound(root.to_path_buf())
            } else {
                WebinatorError::Walk {
                    path: root.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if !root.is_dir() {
            return Err(WebinatorError::NotADirectory(root));
        }

        Ok(Self { root, ignore })
    }

    /// Resolved root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iter(&self) -> Walk {
        Walk {
            inner: WalkDir::new(&self.root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            root: self.root.clone(),
            ignore: self.ignore.clone(),
        }
    }
}

impl IntoIterator for &TreeWalker {
    type Item = Result<FileEntry>;
    type IntoIter = Walk;

    fn into_iter(self) -> Walk {
        self.iter()
    }
}

/// Iterator over one traversal of a [`TreeWalker`]
///
/// Directories are held on walkdir's explicit stack, so traversal depth is
/// not bounded by the call stack. An unreadable directory is yielded as an
/// error; its siblings are still visited.
pub struct Walk {
    inner: walkdir::IntoIter,
    root: PathBuf,
    ignore: IgnoreSet,
}

impl Iterator for Walk {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(walk_error(e, &self.root))),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            if file_type.is_symlink() {
                // Symlinked files are uploaded under the link's own key;
                // symlinked directories are not descended
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => {}
                    Ok(_) => continue,
                    Err(e) => {
                        debug!(
                            path = %entry.path().display(),
                            error = %e,
                            "skipping dangling symlink"
                        );
                        continue;
                    }
                }
            } else if !file_type.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.ignore.matches(&name) {
                debug!(path = %entry.path().display(), "ignored");
                continue;
            }

            let key = match relative_key(&self.root, entry.path()) {
                Some(key) => key,
                None => continue,
            };

            return Some(Ok(FileEntry {
                path: entry.into_path(),
                key,
            }));
        }
    }
}

/// Derive an object key from a path below `root`
///
/// Components are joined with `/` regardless of the host separator.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn walk_error(err: walkdir::Error, root: &Path) -> WebinatorError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
    WebinatorError::Walk { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keys(walker: &TreeWalker) -> Vec<String> {
        walker.iter().map(|e| e.unwrap().key).collect()
    }

    #[test]
    fn test_walks_nested_tree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("assets/img")).unwrap();
        fs::write(temp.path().join("index.html"), b"<html>").unwrap();
        fs::write(temp.path().join("assets/site.css"), b"body{}").unwrap();
        fs::write(temp.path().join("assets/img/logo.png"), b"png").unwrap();

        let walker = TreeWalker::new(temp.path(), IgnoreSet::default()).unwrap();
        let mut found = keys(&walker);
        found.sort();

        assert_eq!(
            found,
            vec!["assets/img/logo.png", "assets/site.css", "index.html"]
        );
    }

    #[test]
    fn test_entries_carry_absolute_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/page.html"), b"x").unwrap();

        let walker = TreeWalker::new(temp.path(), IgnoreSet::default()).unwrap();
        let entry = walker.iter().next().unwrap().unwrap();

        assert_eq!(entry.key, "sub/page.html");
        assert!(entry.path.is_absolute());
        assert_eq!(entry.path, walker.root().join("sub").join("page.html"));
    }

    #[test]
    fn test_ignored_names_at_any_depth() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join(".DS_Store"), b"x").unwrap();
        fs::write(temp.path().join("a/b/.DS_Store"), b"x").unwrap();
        fs::write(temp.path().join("a/b/keep.txt"), b"x").unwrap();

        let walker = TreeWalker::new(temp.path(), IgnoreSet::platform_defaults()).unwrap();
        assert_eq!(keys(&walker), vec!["a/b/keep.txt"]);
    }

    #[test]
    fn test_glob_ignore_patterns() {
        let ignore = IgnoreSet::new(&["*.tmp", "Thumbs.db"]).unwrap();
        assert!(ignore.matches("upload.tmp"));
        assert!(ignore.matches("Thumbs.db"));
        assert!(!ignore.matches("index.html"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = IgnoreSet::new(&["[unclosed"]).unwrap_err();
        assert!(matches!(err, WebinatorError::Config(_)));
    }

    #[test]
    fn test_walk_is_restartable() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"a").unwrap();
        fs::write(temp.path().join("b.txt"), b"b").unwrap();

        let walker = TreeWalker::new(temp.path(), IgnoreSet::default()).unwrap();
        assert_eq!(keys(&walker), keys(&walker));
        assert_eq!(keys(&walker).len(), 2);
    }

    #[test]
    fn test_root_with_dot_components_is_resolved() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("site")).unwrap();
        fs::write(temp.path().join("site/index.html"), b"x").unwrap();

        let dotted = temp.path().join("site/../site/.");
        let walker = TreeWalker::new(&dotted, IgnoreSet::default()).unwrap();

        assert_eq!(keys(&walker), vec!["index.html"]);
        assert_eq!(walker.root(), fs::canonicalize(temp.path().join("site")).unwrap());
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let err = TreeWalker::new(&temp.path().join("nope"), IgnoreSet::default()).unwrap_err();
        assert!(matches!(err, WebinatorError::SourceNotFound(_)));
    }

    #[test]
    fn test_file_root_rejected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        let err = TreeWalker::new(&file, IgnoreSet::default()).unwrap_err();
        assert!(matches!(err, WebinatorError::NotADirectory(_)));
    }

    #[test]
    fn test_relative_key_uses_forward_slashes() {
        let root = Path::new("/srv/site");
        let path = root.join("sub").join("page.html");
        assert_eq!(relative_key(root, &path).as_deref(), Some("sub/page.html"));
        assert_eq!(relative_key(root, root), None);
        assert_eq!(relative_key(root, Path::new("/elsewhere/x")), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_descended() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        fs::write(temp.path().join("real/file.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("real/file.txt"),
            temp.path().join("linked.txt"),
        )
        .unwrap();

        let walker = TreeWalker::new(temp.path(), IgnoreSet::default()).unwrap();
        assert_eq!(keys(&walker), vec!["linked.txt", "real/file.txt"]);
    }
}
