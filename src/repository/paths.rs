// file: src/repository/paths.rs
// description: mapping of local file paths onto repository paths
// reference: https://doc.rust-lang.org/std/path/enum.Component.html

use crate::error::{PublishError, Result};
use std::path::{Component, Path};

/// Path of `file` relative to `root`, joined with `/` whatever the host separator is.
///
/// Fails when `file` is not strictly inside `root` or when a component is not
/// valid UTF-8, since repository paths are text.
pub fn relative_repo_path(root: &Path, file: &Path) -> Result<String> {
    let reject = |reason: &str| PublishError::PathNormalization {
        path: file.to_path_buf(),
        reason: reason.to_string(),
    };

    let relative = file
        .strip_prefix(root)
        .map_err(|_| reject(&format!("not contained in {}", root.display())))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| reject("path component is not valid UTF-8"))?;
                parts.push(part);
            }
            Component::CurDir => continue,
            Component::ParentDir => return Err(reject("path escapes the root via '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject("unexpected absolute component"));
            }
        }
    }

    if parts.is_empty() {
        return Err(reject("path is the root folder itself"));
    }

    Ok(parts.join("/"))
}
