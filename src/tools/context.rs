//! ToolContext - execution context for tools

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::confirm::ConfirmationGate;
use crate::process::ProcessLimits;

use super::ToolError;

/// Execution context shared by every tool in a run
///
/// Holds the engine's working directory (changed only by `cd`), the
/// confirmation gate, and the read-only run settings. Paths that resolve
/// outside the working directory must go through [`ToolContext::authorize_path`].
#[derive(Clone)]
pub struct ToolContext {
    cwd: Arc<RwLock<PathBuf>>,

    /// Gate for out-of-tree paths and side effects
    pub gate: ConfirmationGate,

    /// Process deadline and capture ceiling
    pub limits: ProcessLimits,

    /// Name of the project ignore file honored by listings
    pub ignore_file: String,

    /// Log full tool payloads
    pub debug: bool,
}

impl ToolContext {
    /// Create a new tool context rooted at `cwd`
    pub fn new(cwd: PathBuf, gate: ConfirmationGate) -> Self {
        debug!(?cwd, "ToolContext::new: called");
        Self {
            cwd: Arc::new(RwLock::new(cwd)),
            gate,
            limits: ProcessLimits::default(),
            ignore_file: ".gitignore".to_string(),
            debug: false,
        }
    }

    /// Create a context from loaded configuration
    pub fn from_config(cwd: PathBuf, config: &Config, gate: ConfirmationGate) -> Self {
        debug!(?cwd, "ToolContext::from_config: called");
        Self {
            limits: ProcessLimits {
                timeout: Duration::from_millis(config.process.timeout_ms),
                output_limit: config.process.output_limit,
            },
            ignore_file: config.listing.ignore_file.clone(),
            debug: config.debug,
            ..Self::new(cwd, gate)
        }
    }

    /// Override the process limits
    pub fn with_limits(mut self, limits: ProcessLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Current working directory of the engine
    pub async fn cwd(&self) -> PathBuf {
        self.cwd.read().await.clone()
    }

    /// Change the engine's working directory
    pub async fn set_cwd(&self, dir: PathBuf) {
        debug!(?dir, "ToolContext::set_cwd: called");
        *self.cwd.write().await = dir;
    }

    /// Resolve `path` against the working directory without touching the filesystem
    pub async fn resolve(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd().await.join(path)
        };
        normalize_lexically(&joined)
    }

    /// Whether `path` lies inside the working directory
    pub async fn is_contained(&self, path: &Path) -> bool {
        let cwd = self.cwd().await;
        let root = real_path(&cwd);
        let target = real_path(&self.resolve(path).await);
        let contained = target.starts_with(&root);
        debug!(?target, ?root, %contained, "ToolContext::is_contained: checked");
        contained
    }

    /// Resolve `path` and, if it escapes the working directory, ask the gate
    ///
    /// `action` describes the operation for the prompt and the denial
    /// message, e.g. `Reading "/etc/hosts"`.
    pub async fn authorize_path(&self, path: &Path, action: &str) -> Result<PathBuf, ToolError> {
        let resolved = self.resolve(path).await;
        if self.is_contained(&resolved).await {
            return Ok(resolved);
        }

        debug!(?resolved, "ToolContext::authorize_path: outside working directory");
        if self.gate.confirm(&format!("Allow agent: {}?", action)).await {
            Ok(resolved)
        } else {
            Err(ToolError::NotConfirmed {
                action: action.to_string(),
            })
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("gate", &self.gate)
            .field("limits", &self.limits)
            .field("ignore_file", &self.ignore_file)
            .finish()
    }
}

/// Remove `.` and resolve `..` components without following symlinks
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Canonicalize the longest existing prefix of `path` and re-append the rest
///
/// Targets that do not exist yet (a file about to be written) still get
/// symlinks in their existing ancestors resolved.
fn real_path(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return rest.iter().rev().fold(canonical, |acc: PathBuf, part| acc.join(part));
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}
