//! Error types for branchsync-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from descriptor rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error (syntax error, missing variable, …).
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested template is neither embedded nor in the template dir.
    #[error("unknown job template '{name}'")]
    UnknownTemplate { name: String },

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}
