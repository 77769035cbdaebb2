//! Collaborator traits the reconciler is built on.
//!
//! Implementations are thin transport wrappers; see `branchsync-gateway` for
//! the git and Jenkins ones and `branchsync_sync::fakes` for in-memory fakes.

use crate::error::GatewayError;
use crate::types::{BranchName, Descriptor, JobName, ViewHandle, ViewName};

/// Read-only view of the version-control repository.
pub trait RepositoryGateway {
    /// URL of the `origin` remote, handed to the descriptor renderer.
    fn remote_url(&self) -> Result<String, GatewayError>;

    /// Names of every branch head on the remote. May be empty.
    fn remote_branch_names(&self) -> Result<Vec<BranchName>, GatewayError>;
}

impl<T: RepositoryGateway + ?Sized> RepositoryGateway for &T {
    fn remote_url(&self) -> Result<String, GatewayError> {
        (**self).remote_url()
    }

    fn remote_branch_names(&self) -> Result<Vec<BranchName>, GatewayError> {
        (**self).remote_branch_names()
    }
}

/// CI server jobs and views.
///
/// Reads take `&self`; mutations take `&mut self` so that decorators and
/// fakes can record them without interior mutability.
pub trait CiGateway {
    fn list_jobs(&self) -> Result<Vec<JobName>, GatewayError>;

    fn list_views(&self) -> Result<Vec<ViewName>, GatewayError>;

    fn create_job(&mut self, name: &JobName, descriptor: &Descriptor) -> Result<(), GatewayError>;

    fn delete_job(&mut self, name: &JobName) -> Result<(), GatewayError>;

    fn create_view(&mut self, name: &ViewName) -> Result<ViewHandle, GatewayError>;

    fn add_job_to_view(&mut self, view: &ViewHandle, job: &JobName) -> Result<(), GatewayError>;

    fn delete_view(&mut self, name: &ViewName) -> Result<(), GatewayError>;
}

impl<T: CiGateway + ?Sized> CiGateway for &mut T {
    fn list_jobs(&self) -> Result<Vec<JobName>, GatewayError> {
        (**self).list_jobs()
    }

    fn list_views(&self) -> Result<Vec<ViewName>, GatewayError> {
        (**self).list_views()
    }

    fn create_job(&mut self, name: &JobName, descriptor: &Descriptor) -> Result<(), GatewayError> {
        (**self).create_job(name, descriptor)
    }

    fn delete_job(&mut self, name: &JobName) -> Result<(), GatewayError> {
        (**self).delete_job(name)
    }

    fn create_view(&mut self, name: &ViewName) -> Result<ViewHandle, GatewayError> {
        (**self).create_view(name)
    }

    fn add_job_to_view(&mut self, view: &ViewHandle, job: &JobName) -> Result<(), GatewayError> {
        (**self).add_job_to_view(view, job)
    }

    fn delete_view(&mut self, name: &ViewName) -> Result<(), GatewayError> {
        (**self).delete_view(name)
    }
}

/// Extract branch names from `git ls-remote --heads` output.
///
/// Each line of the form `<sha>\trefs/heads/<name>` contributes `<name>`.
/// Anything else (blank lines, tags, symbolic refs, garbage) is skipped.
/// Duplicates keep their first position.
pub fn parse_ls_remote_heads(output: &str) -> Vec<BranchName> {
    let mut branches: Vec<BranchName> = Vec::new();
    for line in output.lines() {
        let Some((sha, reference)) = line.split_once('\t') else {
            continue;
        };
        if sha.is_empty() || !sha.chars().all(|c| c.is_alphanumeric() || c == '_') {
            continue;
        }
        let Some(name) = reference.trim_end_matches('\r').strip_prefix("refs/heads/") else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let branch = BranchName::from(name);
        if !branches.contains(&branch) {
            branches.push(branch);
        }
    }
    branches
}
