//! IgnoreFilter - decides which paths a listing may show

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

/// Version-control and package-manager names hidden at any depth
pub const DEFAULT_IGNORE_NAMES: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    ".yarn",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "bun.lockb",
];

/// Visibility predicate for paths under a traversal root
///
/// Combines the fixed deny-list with the project ignore file at the root
/// (gitignore semantics: negation, directory-only patterns, globs). The
/// fixed names always apply, even when the ignore file is missing or
/// unreadable.
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    root: PathBuf,
    project: Option<Gitignore>,
    disabled: bool,
}

impl IgnoreFilter {
    /// Build the filter for `root`, reading `ignore_file` from it if present
    pub fn new(root: &Path, ignore_file: &str) -> Self {
        debug!(?root, %ignore_file, "IgnoreFilter::new: called");
        Self {
            root: root.to_path_buf(),
            project: load_project_rules(root, ignore_file),
            disabled: false,
        }
    }

    /// Filter that includes everything (audit mode)
    pub fn disabled(root: &Path) -> Self {
        debug!(?root, "IgnoreFilter::disabled: called");
        Self {
            root: root.to_path_buf(),
            project: None,
            disabled: true,
        }
    }

    /// Root this filter was built for
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` should be visible, looking up whether it is a directory
    pub fn is_included(&self, path: &Path) -> bool {
        self.should_include(path, path.is_dir())
    }

    /// Whether `path` should be visible, given whether it is a directory
    pub fn should_include(&self, path: &Path, is_dir: bool) -> bool {
        if self.disabled {
            return true;
        }

        let relative = match path.strip_prefix(&self.root) {
            Ok(rel) => rel,
            Err(_) => {
                debug!(?path, "IgnoreFilter::should_include: path outside root, including");
                return true;
            }
        };

        if relative.as_os_str().is_empty() {
            return true;
        }

        if relative
            .components()
            .any(|c| DEFAULT_IGNORE_NAMES.iter().any(|name| c.as_os_str() == *name))
        {
            return false;
        }

        match &self.project {
            Some(rules) => !rules.matched_path_or_any_parents(relative, is_dir).is_ignore(),
            None => true,
        }
    }
}

fn load_project_rules(root: &Path, ignore_file: &str) -> Option<Gitignore> {
    let path = root.join(ignore_file);
    if !path.is_file() {
        debug!(?path, "load_project_rules: no ignore file");
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(e) = builder.add(&path) {
        warn!(?path, %e, "load_project_rules: ignore file partially unreadable");
    }
    match builder.build() {
        Ok(rules) => {
            debug!(count = rules.num_ignores(), "load_project_rules: rules loaded");
            Some(rules)
        }
        Err(e) => {
            warn!(?path, %e, "load_project_rules: falling back to default names only");
            None
        }
    }
}
