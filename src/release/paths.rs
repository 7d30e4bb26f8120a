//! Stored-path resolution against candidate base directories.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Resolves stored relative image locations to usable filesystem paths.
#[derive(Debug, Clone)]
pub struct PathResolver {
    bases: Vec<PathBuf>,
}

impl PathResolver {
    /// Creates a resolver probing the given bases in order.
    pub fn new(bases: Vec<PathBuf>) -> Self {
        Self { bases }
    }

    /// Resolver over the conventional locations: the working directory, the
    /// projects root, and the uploads root.
    pub fn with_default_bases() -> Self {
        Self::new(vec![
            PathBuf::from("."),
            PathBuf::from("projects"),
            PathBuf::from("uploads"),
        ])
    }

    /// Resolves a stored path.
    ///
    /// Absolute paths are returned unchanged. Relative paths are joined
    /// against each base in order and the first existing candidate wins.
    /// When no candidate exists, the original path is returned so the
    /// caller can detect non-existence and skip.
    pub fn resolve(&self, stored: &Path) -> PathBuf {
        if stored.is_absolute() {
            return stored.to_path_buf();
        }

        for base in &self.bases {
            let candidate = base.join(stored);
            if candidate.exists() {
                return candidate;
            }
        }

        debug!(path = %stored.display(), "Path did not resolve against any base");
        stored.to_path_buf()
    }
}
