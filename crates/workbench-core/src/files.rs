//! Workflow source file writer.
//!
//! Path contract: targets are always interpreted relative to the
//! orchestrator root. Absolute paths and `..` components are rejected
//! before anything touches the filesystem. Writes are plain
//! truncate-and-write — the artifacts are regenerable, so no atomic
//! rename is attempted.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("{0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `content` to `rel_path` under `root`, creating missing parent
/// directories. Returns the absolute path written.
pub fn write_workflow_file(
    root: &Path,
    rel_path: &str,
    content: &str,
) -> Result<PathBuf, WriteError> {
    let rel = validate_relative(rel_path)?;
    let target = root.join(rel);

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target, content)?;
    Ok(target)
}

fn validate_relative(raw: &str) -> Result<&Path, WriteError> {
    if raw.trim().is_empty() {
        return Err(WriteError::InvalidPath("path is empty".to_string()));
    }

    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(WriteError::InvalidPath(format!(
            "path must be relative to the orchestrator root: {}",
            raw
        )));
    }
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(WriteError::InvalidPath(format!(
                    "path may not contain '..': {}",
                    raw
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(WriteError::InvalidPath(format!(
                    "path must be relative to the orchestrator root: {}",
                    raw
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(path)
}
