//! # branchsync-gateway
//!
//! Concrete collaborators for the reconciler:
//!
//! - [`GitRepository`]: shells out to `git` for the origin URL and
//!   `ls-remote --heads`
//! - [`JenkinsClient`]: Jenkins JSON/HTTP API over `ureq`

pub mod git;
pub mod jenkins;

pub use git::GitRepository;
pub use jenkins::JenkinsClient;
