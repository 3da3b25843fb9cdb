//! Path canonicalization for scanned entries.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    /// The path does not exist, is inaccessible, or loops through symlinks.
    #[error("cannot resolve path {}", path.display())]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The canonical form still contains `.` or `..` components.
    #[error("unsafe path {}", path.display())]
    Unsafe { path: PathBuf },
}

/// Resolves symlinks and `.`/`..` components, returning the canonical path.
///
/// Fails if the path cannot be resolved or if the canonical form still
/// contains a relative component.
pub fn validate_path(path: &Path) -> Result<PathBuf, PathError> {
    let canonical = path
        .canonicalize()
        .map_err(|source| PathError::Unresolvable {
            path: path.to_path_buf(),
            source,
        })?;

    if canonical
        .components()
        .any(|c| matches!(c, Component::CurDir | Component::ParentDir))
    {
        return Err(PathError::Unsafe { path: canonical });
    }
    Ok(canonical)
}
