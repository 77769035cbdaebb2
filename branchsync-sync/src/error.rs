//! Error types for branchsync-sync.

use thiserror::Error;

use branchsync_core::{error::GatewayError, types::BranchName};
use branchsync_renderer::RenderError;

use crate::plan::Action;

/// Every failure aborts the rest of the run. Mutations applied before the
/// failure stay applied; `applied` says how many.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A read-only gateway call failed.
    #[error("failed to {operation}: {source}")]
    Discovery {
        operation: &'static str,
        #[source]
        source: GatewayError,
    },

    /// The descriptor for a new job could not be rendered.
    #[error("failed to render job descriptor for branch '{branch}' ({applied} change(s) already applied): {source}")]
    Render {
        branch: BranchName,
        applied: usize,
        #[source]
        source: RenderError,
    },

    /// A create/delete/populate call failed.
    #[error("failed to {action} ({applied} change(s) already applied): {source}")]
    Mutation {
        action: Action,
        applied: usize,
        #[source]
        source: GatewayError,
    },
}

impl ReconcileError {
    pub(crate) fn discovery(operation: &'static str) -> impl FnOnce(GatewayError) -> Self {
        move |source| ReconcileError::Discovery { operation, source }
    }
}
