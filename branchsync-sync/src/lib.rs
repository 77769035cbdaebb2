//! # branchsync-sync
//!
//! The reconciliation engine: discover branches and managed jobs/views,
//! compute a [`Plan`], and apply it through a [`CiGateway`], optionally via
//! the log-and-skip [`PreviewGateway`].
//!
//! [`CiGateway`]: branchsync_core::CiGateway

pub mod engine;
pub mod error;
pub mod fakes;
pub mod plan;
pub mod preview;

pub use engine::{ReconcileOptions, ReconcileReport, Reconciler};
pub use error::ReconcileError;
pub use plan::{Action, Plan};
pub use preview::PreviewGateway;
