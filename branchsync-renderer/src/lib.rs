//! # branchsync-renderer
//!
//! Tera-based renderer that turns a job template, a repository URL and a
//! branch name into the job descriptor sent to the CI server.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use branchsync_core::types::BranchName;
//! use branchsync_renderer::{DescriptorRenderer, TemplateEngine};
//!
//! fn show(branch: &BranchName) {
//!     if let Ok(engine) = TemplateEngine::new(None) {
//!         if let Ok(descriptor) = engine.render("job.xml.tera", "git@host:app.git", branch) {
//!             println!("{}", descriptor.as_str());
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::JobContext;
pub use engine::{DescriptorRenderer, TemplateEngine};
pub use error::RenderError;
