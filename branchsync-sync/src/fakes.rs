//! In-memory fakes for the gateway traits.
//!
//! [`MemoryCi`] mirrors a CI server: creating a job that exists, deleting one
//! that does not, or populating a missing view fails the way the real server
//! would. Every mutation is recorded so tests can assert on call sequences.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use branchsync_core::{
    error::GatewayError,
    gateway::{CiGateway, RepositoryGateway},
    types::{BranchName, Descriptor, JobName, ViewHandle, ViewName},
};
use branchsync_renderer::{DescriptorRenderer, RenderError};

// ---------------------------------------------------------------------------
// MemoryCi
// ---------------------------------------------------------------------------

/// A call made against [`MemoryCi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiCall {
    ListJobs,
    ListViews,
    CreateJob(JobName),
    DeleteJob(JobName),
    CreateView(ViewName),
    AddJobToView(ViewName, JobName),
    DeleteView(ViewName),
}

impl CiCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, CiCall::ListJobs | CiCall::ListViews)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCi {
    jobs: BTreeMap<JobName, Descriptor>,
    views: BTreeMap<ViewName, BTreeSet<JobName>>,
    mutations: Vec<CiCall>,
    reads: Cell<usize>,
    fail_on: Option<CiCall>,
}

impl MemoryCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(mut self, names: &[&str]) -> Self {
        for name in names {
            self.jobs.insert(JobName::from(*name), Descriptor(String::new()));
        }
        self
    }

    pub fn with_views(mut self, names: &[&str]) -> Self {
        for name in names {
            self.views.insert(ViewName::from(*name), BTreeSet::new());
        }
        self
    }

    /// Fail the first call equal to `call` with an HTTP 500.
    pub fn failing_on(mut self, call: CiCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn mutations(&self) -> &[CiCall] {
        &self.mutations
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn clear_calls(&mut self) {
        self.mutations.clear();
        self.reads.set(0);
    }

    pub fn job_names(&self) -> BTreeSet<String> {
        self.jobs.keys().map(|j| j.0.clone()).collect()
    }

    pub fn view_names(&self) -> BTreeSet<String> {
        self.views.keys().map(|v| v.0.clone()).collect()
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.jobs.contains_key(&JobName::from(name))
    }

    pub fn descriptor(&self, name: &str) -> Option<&Descriptor> {
        self.jobs.get(&JobName::from(name))
    }

    pub fn jobs_in_view(&self, view: &str) -> Option<&BTreeSet<JobName>> {
        self.views.get(&ViewName::from(view))
    }

    fn check(&self, call: &CiCall) -> Result<(), GatewayError> {
        if self.fail_on.as_ref() == Some(call) {
            return Err(server_error(format!("injected failure on {call:?}")));
        }
        Ok(())
    }

    fn record(&mut self, call: CiCall) -> Result<(), GatewayError> {
        self.check(&call)?;
        self.mutations.push(call);
        Ok(())
    }
}

fn server_error(body: String) -> GatewayError {
    GatewayError::Status { method: "POST", url: "memory://ci".to_string(), status: 500, body }
}

fn not_found(body: String) -> GatewayError {
    GatewayError::Status { method: "POST", url: "memory://ci".to_string(), status: 404, body }
}

impl CiGateway for MemoryCi {
    fn list_jobs(&self) -> Result<Vec<JobName>, GatewayError> {
        self.check(&CiCall::ListJobs)?;
        self.reads.set(self.reads.get() + 1);
        Ok(self.jobs.keys().cloned().collect())
    }

    fn list_views(&self) -> Result<Vec<ViewName>, GatewayError> {
        self.check(&CiCall::ListViews)?;
        self.reads.set(self.reads.get() + 1);
        Ok(self.views.keys().cloned().collect())
    }

    fn create_job(&mut self, name: &JobName, descriptor: &Descriptor) -> Result<(), GatewayError> {
        self.record(CiCall::CreateJob(name.clone()))?;
        if self.jobs.contains_key(name) {
            return Err(GatewayError::Status {
                method: "POST",
                url: "memory://ci".to_string(),
                status: 400,
                body: format!("job {name} already exists"),
            });
        }
        self.jobs.insert(name.clone(), descriptor.clone());
        Ok(())
    }

    fn delete_job(&mut self, name: &JobName) -> Result<(), GatewayError> {
        self.record(CiCall::DeleteJob(name.clone()))?;
        if self.jobs.remove(name).is_none() {
            return Err(not_found(format!("no job {name}")));
        }
        for members in self.views.values_mut() {
            members.remove(name);
        }
        Ok(())
    }

    fn create_view(&mut self, name: &ViewName) -> Result<ViewHandle, GatewayError> {
        self.record(CiCall::CreateView(name.clone()))?;
        if self.views.contains_key(name) {
            return Err(GatewayError::Status {
                method: "POST",
                url: "memory://ci".to_string(),
                status: 400,
                body: format!("view {name} already exists"),
            });
        }
        self.views.insert(name.clone(), BTreeSet::new());
        Ok(ViewHandle::existing(name.clone()))
    }

    fn add_job_to_view(&mut self, view: &ViewHandle, job: &JobName) -> Result<(), GatewayError> {
        self.record(CiCall::AddJobToView(view.name.clone(), job.clone()))?;
        if !self.jobs.contains_key(job) {
            return Err(not_found(format!("no job {job}")));
        }
        match self.views.get_mut(&view.name) {
            Some(members) => {
                members.insert(job.clone());
                Ok(())
            }
            None => Err(not_found(format!("no view {}", view.name))),
        }
    }

    fn delete_view(&mut self, name: &ViewName) -> Result<(), GatewayError> {
        self.record(CiCall::DeleteView(name.clone()))?;
        match self.views.remove(name) {
            Some(_) => Ok(()),
            None => Err(not_found(format!("no view {name}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryRepo
// ---------------------------------------------------------------------------

/// Fixed remote URL and branch list.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    pub url: String,
    pub branches: Vec<BranchName>,
    pub fail_branches: bool,
    pub fail_url: bool,
}

impl MemoryRepo {
    pub fn new(url: &str, branches: &[&str]) -> Self {
        Self {
            url: url.to_string(),
            branches: branches.iter().map(|b| BranchName::from(*b)).collect(),
            ..Default::default()
        }
    }

    pub fn set_branches(&mut self, branches: &[&str]) {
        self.branches = branches.iter().map(|b| BranchName::from(*b)).collect();
    }

    /// Fail the branch listing.
    pub fn failing(mut self) -> Self {
        self.fail_branches = true;
        self
    }

    /// Fail the remote URL lookup only.
    pub fn failing_url(mut self) -> Self {
        self.fail_url = true;
        self
    }
}

fn unreachable_remote(command: &str) -> GatewayError {
    GatewayError::Command {
        command: command.to_string(),
        stderr: "fatal: could not read from remote repository".to_string(),
    }
}

impl RepositoryGateway for MemoryRepo {
    fn remote_url(&self) -> Result<String, GatewayError> {
        if self.fail_url {
            return Err(unreachable_remote("git remote get-url origin"));
        }
        Ok(self.url.clone())
    }

    fn remote_branch_names(&self) -> Result<Vec<BranchName>, GatewayError> {
        if self.fail_branches {
            return Err(unreachable_remote("git ls-remote --heads origin"));
        }
        Ok(self.branches.clone())
    }
}

// ---------------------------------------------------------------------------
// StubRenderer
// ---------------------------------------------------------------------------

/// Renders `<job template=".." repo=".." branch=".."/>`; optionally fails for
/// one branch.
#[derive(Debug, Clone, Default)]
pub struct StubRenderer {
    pub fail_for: Option<BranchName>,
}

impl StubRenderer {
    pub fn failing_for(branch: &str) -> Self {
        Self { fail_for: Some(BranchName::from(branch)) }
    }
}

impl DescriptorRenderer for StubRenderer {
    fn render(
        &self,
        template: &str,
        repo_url: &str,
        branch: &BranchName,
    ) -> Result<Descriptor, RenderError> {
        if self.fail_for.as_ref() == Some(branch) {
            return Err(RenderError::UnknownTemplate { name: template.to_string() });
        }
        Ok(Descriptor(format!(
            r#"<job template="{template}" repo="{repo_url}" branch="{branch}"/>"#
        )))
    }
}
