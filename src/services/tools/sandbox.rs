//! Path Sandbox
//!
//! Lexical confinement of tool paths to the project root.

use std::path::{Component, Path, PathBuf};

/// Resolve a model-supplied path against the project root.
///
/// Purely lexical: `.` components are dropped, `..` pops, and anything that
/// would walk above the root (or an absolute path) is rejected before any
/// filesystem access.
pub fn resolve_sandboxed(root: &Path, raw: &str) -> Result<PathBuf, String> {
    if raw.trim().is_empty() {
        return Err("Path must not be empty".to_string());
    }
    let candidate = Path::new(raw);
    if candidate.is_absolute() {
        return Err(format!("Path escapes the project root: {raw}"));
    }
    let mut normalized = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(format!("Path escapes the project root: {raw}"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("Path escapes the project root: {raw}"));
            }
        }
    }
    Ok(root.join(normalized))
}
