use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{OperationResult, OrchestrationError};
use crate::registry::BuildSpec;

pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// A build context that has been fully written and moved into place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedContext {
    pub dir: PathBuf,
    pub dockerfile: PathBuf,
}

/// Write the build context for `spec` under `root`.
///
/// Files go into a fresh staging directory first, which is renamed onto
/// `<root>/<tag>` only once every write succeeded. Any failure drops the
/// staging directory, so the final path never holds a partial context. A
/// previous context for the same tag is replaced as a whole.
pub fn materialize(root: &Path, spec: &BuildSpec) -> OperationResult<StagedContext> {
    for rel in spec.files.keys() {
        validate_entry(rel)?;
    }

    fs::create_dir_all(root).map_err(|e| io_error(root, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(root)
        .map_err(|e| io_error(root, e))?;

    for (rel, content) in &spec.files {
        let path = staging.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(rel, e))?;
        }
        fs::write(&path, content).map_err(|e| io_error(rel, e))?;
    }
    fs::write(staging.path().join(DOCKERFILE_NAME), &spec.dockerfile)
        .map_err(|e| io_error(Path::new(DOCKERFILE_NAME), e))?;

    let dir = root.join(dir_name(&spec.tag));
    swap_into_place(root, staging.path(), &dir)?;
    debug!(tag = %spec.tag, dir = %dir.display(), files = spec.files.len(), "build context staged");

    Ok(StagedContext {
        dockerfile: dir.join(DOCKERFILE_NAME),
        dir,
    })
}

fn swap_into_place(root: &Path, staged: &Path, dir: &Path) -> OperationResult<()> {
    // Holds the previous context until the new one is in place; removed on drop.
    let retired = if dir.exists() {
        let holder = tempfile::Builder::new()
            .prefix(".retired-")
            .tempdir_in(root)
            .map_err(|e| io_error(root, e))?;
        let old = holder.path().join("context");
        fs::rename(dir, &old).map_err(|e| io_error(dir, e))?;
        Some((holder, old))
    } else {
        None
    };

    if let Err(e) = fs::rename(staged, dir) {
        if let Some((_, old)) = &retired {
            let _ = fs::rename(old, dir);
        }
        return Err(io_error(dir, e));
    }
    Ok(())
}

fn validate_entry(rel: &Path) -> OperationResult<()> {
    let invalid = |reason: &str| OrchestrationError::InvalidContext {
        path: rel.to_path_buf(),
        reason: reason.to_string(),
    };

    if rel.as_os_str().is_empty() {
        return Err(invalid("empty path"));
    }
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(invalid("must be relative and stay inside the context"));
    }
    if rel == Path::new(DOCKERFILE_NAME) {
        return Err(invalid("collides with the generated Dockerfile"));
    }
    Ok(())
}

/// Directory name for a tag; registry paths and `:version` suffixes are flattened.
fn dir_name(tag: &str) -> String {
    tag.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path, err: std::io::Error) -> OrchestrationError {
    OrchestrationError::InvalidContext {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
