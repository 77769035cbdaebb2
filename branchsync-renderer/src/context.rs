//! Template context: the values a job template can reference.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Rendering payload for one branch. Templates see `git_repo` and
/// `git_branch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobContext {
    /// Remote URL of the repository (`origin`).
    pub git_repo: String,
    /// Branch the job builds.
    pub git_branch: String,
}

impl JobContext {
    pub fn new(git_repo: impl Into<String>, git_branch: impl Into<String>) -> Self {
        Self {
            git_repo: git_repo.into(),
            git_branch: git_branch.into(),
        }
    }

    /// Convert to a [`tera::Context`].
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}
