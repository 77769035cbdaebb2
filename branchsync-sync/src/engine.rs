//! The reconciler: discovery, planning and application.
//!
//! ## Run flow
//!
//! 1. List CI jobs, keep the managed ones.
//! 2. List CI views, keep the managed ones.
//! 3. List remote branch heads.
//! 4. Build a [`Plan`] and apply it, rendering a descriptor for every new job.
//!
//! In preview mode step 4 goes through [`PreviewGateway`], so the plan and the
//! order in which it is walked are exactly those of a live run.

use std::collections::HashSet;

use branchsync_core::{
    config::Settings,
    gateway::{CiGateway, RepositoryGateway},
    naming::NamingConvention,
    types::{BranchName, JobName, ViewHandle, ViewName},
};
use branchsync_renderer::DescriptorRenderer;

use crate::error::ReconcileError;
use crate::plan::{Action, Plan};
use crate::preview::PreviewGateway;

/// The subset of [`Settings`] the engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub naming: NamingConvention,
    pub template: String,
    pub preview: bool,
}

impl From<&Settings> for ReconcileOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            naming: settings.naming.clone(),
            template: settings.template_name.clone(),
            preview: settings.preview,
        }
    }
}

/// Outcome of a full [`Reconciler::reconcile`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub preview: bool,
    pub branches: Vec<BranchName>,
    pub existing_jobs: Vec<JobName>,
    pub existing_views: Vec<ViewName>,
    /// Applied actions in order, or the ones that would be applied in preview.
    pub actions: Vec<Action>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

pub struct Reconciler<R, C, D> {
    options: ReconcileOptions,
    repo: R,
    ci: C,
    renderer: D,
}

impl<R, C, D> Reconciler<R, C, D>
where
    R: RepositoryGateway,
    C: CiGateway,
    D: DescriptorRenderer,
{
    pub fn new(options: ReconcileOptions, repo: R, ci: C, renderer: D) -> Self {
        Self { options, repo, ci, renderer }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn ci(&self) -> &C {
        &self.ci
    }

    pub fn into_ci(self) -> C {
        self.ci
    }

    /// Managed jobs currently on the CI server, in server order.
    pub fn discover_existing_jobs(&self) -> Result<Vec<JobName>, ReconcileError> {
        let all = self.ci.list_jobs().map_err(ReconcileError::discovery("list CI jobs"))?;
        let naming = &self.options.naming;
        let managed = dedup(all.into_iter().filter(|j| naming.is_managed_job(j.as_str())));
        tracing::debug!(count = managed.len(), "discovered managed jobs");
        Ok(managed)
    }

    /// Managed views currently on the CI server, in server order.
    pub fn discover_existing_views(&self) -> Result<Vec<ViewName>, ReconcileError> {
        let all = self.ci.list_views().map_err(ReconcileError::discovery("list CI views"))?;
        let naming = &self.options.naming;
        let managed = dedup(all.into_iter().filter(|v| naming.is_managed_view(v.as_str())));
        tracing::debug!(count = managed.len(), "discovered managed views");
        Ok(managed)
    }

    /// Branch heads on the remote. Empty is fine: it means every managed job
    /// and view goes away.
    pub fn discover_branches(&self) -> Result<Vec<BranchName>, ReconcileError> {
        let branches = self
            .repo
            .remote_branch_names()
            .map_err(ReconcileError::discovery("list remote branches"))?;
        let branches = dedup(branches.into_iter().filter(|b| !b.0.is_empty()));
        tracing::debug!(count = branches.len(), "discovered remote branches");
        Ok(branches)
    }

    pub fn plan(
        &self,
        branches: &[BranchName],
        existing_jobs: &[JobName],
        existing_views: &[ViewName],
    ) -> Plan {
        Plan::build(&self.options.naming, branches, existing_jobs, existing_views)
    }

    /// Apply `plan` against the CI server, or against a [`PreviewGateway`]
    /// wrapping it when preview is on. Stops at the first failure.
    pub fn apply(&mut self, plan: &Plan) -> Result<Vec<Action>, ReconcileError> {
        let Reconciler { options, repo, ci, renderer } = self;
        if options.preview {
            let mut preview = PreviewGateway::new(&mut *ci);
            execute(plan, &mut preview, &*repo, &*renderer, &options.template)
        } else {
            execute(plan, &mut *ci, &*repo, &*renderer, &options.template)
        }
    }

    /// Run every phase and apply the resulting plan.
    pub fn reconcile(&mut self) -> Result<ReconcileReport, ReconcileError> {
        let existing_jobs = self.discover_existing_jobs()?;
        let existing_views = self.discover_existing_views()?;
        let branches = self.discover_branches()?;

        let plan = self.plan(&branches, &existing_jobs, &existing_views);
        tracing::info!(
            branches = branches.len(),
            jobs_to_create = plan.jobs_to_create().count(),
            jobs_to_delete = plan.jobs_to_delete().count(),
            views_to_create = plan.views_to_create().count(),
            views_to_delete = plan.views_to_delete().count(),
            preview = self.options.preview,
            "reconciliation plan"
        );

        let actions = self.apply(&plan)?;
        Ok(ReconcileReport {
            preview: self.options.preview,
            branches,
            existing_jobs,
            existing_views,
            actions,
        })
    }
}

fn execute<G, R, D>(
    plan: &Plan,
    ci: &mut G,
    repo: &R,
    renderer: &D,
    template: &str,
) -> Result<Vec<Action>, ReconcileError>
where
    G: CiGateway,
    R: RepositoryGateway,
    D: DescriptorRenderer,
{
    let mut repo_url: Option<String> = None;
    let mut handles: Vec<ViewHandle> = Vec::new();
    let mut applied: Vec<Action> = Vec::with_capacity(plan.len());

    for action in &plan.actions {
        tracing::debug!(%action, "applying");
        let result = match action {
            Action::CreateJob { branch, job } => {
                let url = match &repo_url {
                    Some(url) => url.clone(),
                    None => {
                        let url = repo
                            .remote_url()
                            .map_err(ReconcileError::discovery("read repository remote URL"))?;
                        repo_url = Some(url.clone());
                        url
                    }
                };
                let descriptor = renderer.render(template, &url, branch).map_err(|source| {
                    ReconcileError::Render {
                        branch: branch.clone(),
                        applied: applied.len(),
                        source,
                    }
                })?;
                ci.create_job(job, &descriptor)
            }
            Action::CreateView { view } => ci.create_view(view).map(|handle| handles.push(handle)),
            Action::AddJobToView { view, job } => {
                let handle = handles
                    .iter()
                    .find(|h| &h.name == view)
                    .cloned()
                    .unwrap_or_else(|| ViewHandle::existing(view.clone()));
                ci.add_job_to_view(&handle, job)
            }
            Action::DeleteJob { job } => ci.delete_job(job),
            Action::DeleteView { view } => ci.delete_view(view),
        };
        result.map_err(|source| ReconcileError::Mutation {
            action: action.clone(),
            applied: applied.len(),
            source,
        })?;
        applied.push(action.clone());
    }
    Ok(applied)
}

fn dedup<T: Clone + Eq + std::hash::Hash>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(item.clone())).collect()
}
