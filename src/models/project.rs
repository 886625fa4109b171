//! Project Model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A project: a named sandbox root plus its conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Absolute path of the sandbox root; immutable after creation
    pub root_path: PathBuf,
    pub created_at: String,
}
