//! DirectoryWalker - bounded-depth file enumeration

use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt, join_all};
use tracing::debug;

use super::IgnoreFilter;

/// Enumerate files under `root`, descending at most `depth` levels
///
/// `depth == 0` lists only the files directly in `root`. Directories are
/// never returned. A directory's own files come before the files of its
/// subdirectories; siblings are walked concurrently and merged in name
/// order. Unreadable directories contribute nothing instead of failing
/// the walk.
pub async fn walk(root: &Path, depth: usize, filter: &IgnoreFilter) -> Vec<PathBuf> {
    debug!(?root, %depth, "walk: called");
    if !filter.should_include(root, true) {
        return Vec::new();
    }
    walk_dir(root.to_path_buf(), depth, filter).await
}

fn walk_dir(dir: PathBuf, depth: usize, filter: &IgnoreFilter) -> BoxFuture<'_, Vec<PathBuf>> {
    async move {
        let (files, dirs) = match read_entries(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(?dir, %e, "walk_dir: unreadable directory, skipping");
                return Vec::new();
            }
        };

        let mut results: Vec<PathBuf> = files.into_iter().filter(|f| filter.should_include(f, false)).collect();

        if depth == 0 {
            return results;
        }

        let children = dirs
            .into_iter()
            .filter(|d| filter.should_include(d, true))
            .map(|d| walk_dir(d, depth - 1, filter));
        for nested in join_all(children).await {
            results.extend(nested);
        }
        results
    }
    .boxed()
}

/// Split a directory's entries into sorted files and subdirectories
async fn read_entries(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let file_type = match entry.file_type().await {
            Ok(t) => t,
            Err(_) => continue,
        };
        if file_type.is_file() {
            files.push(entry.path());
        } else if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }

    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn fixture() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::write(root.join("README.md"), "readme").unwrap();
        fs::write(root.join("package-lock.json"), "{}").unwrap();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::write(root.join("src/lib.rs"), "").unwrap();
        fs::write(root.join("src/nested/deep.rs"), "").unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(root.join("src/node_modules/dep")).unwrap();
        fs::write(root.join("src/node_modules/dep/index.js"), "").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_depth_zero_lists_root_files_only() {
        let temp = fixture();
        let root = temp.path();
        let filter = IgnoreFilter::new(root, ".gitignore");

        let files = walk(root, 0, &filter).await;
        assert_eq!(relative(root, &files), vec!["README.md"]);
    }

    #[tokio::test]
    async fn test_depth_bounds_recursion() {
        let temp = fixture();
        let root = temp.path();
        let filter = IgnoreFilter::new(root, ".gitignore");

        let files = relative(root, &walk(root, 1, &filter).await);
        assert_eq!(files, vec!["README.md", "src/lib.rs"]);

        let files = relative(root, &walk(root, 5, &filter).await);
        assert_eq!(files, vec!["README.md", "src/lib.rs", "src/nested/deep.rs"]);
    }

    #[tokio::test]
    async fn test_infra_dirs_never_returned_when_filtering() {
        let temp = fixture();
        let root = temp.path();
        let filter = IgnoreFilter::new(root, ".gitignore");

        let files = relative(root, &walk(root, 10, &filter).await);
        assert!(
            !files
                .iter()
                .any(|f| f.split('/').any(|p| p == ".git" || p == "node_modules" || p == "package-lock.json"))
        );
    }

    #[tokio::test]
    async fn test_disabled_filter_returns_infra_paths() {
        let temp = fixture();
        let root = temp.path();
        let filter = IgnoreFilter::disabled(root);

        let files = relative(root, &walk(root, 10, &filter).await);
        assert!(files.contains(&".git/HEAD".to_string()));
        assert!(files.contains(&"src/node_modules/dep/index.js".to_string()));
        assert!(files.contains(&"package-lock.json".to_string()));
    }

    #[tokio::test]
    async fn test_missing_root_yields_empty() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("nope");
        let filter = IgnoreFilter::new(&missing, ".gitignore");

        assert!(walk(&missing, 3, &filter).await.is_empty());
    }
}
