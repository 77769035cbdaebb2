//! Set difference between the branches on the remote and the managed jobs
//! and views on the CI server.
//!
//! Actions are ordered the way they must be applied: for each branch its job
//! then its view, and only after every branch the job deletions followed by
//! the view deletions.

use std::collections::HashSet;
use std::fmt;

use branchsync_core::{
    naming::NamingConvention,
    types::{BranchName, JobName, ViewName},
};

/// One mutating CI call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateJob { branch: BranchName, job: JobName },
    CreateView { view: ViewName },
    /// Attach `job` to `view`. Follows a `CreateView`, or a `CreateJob` whose
    /// view already existed.
    AddJobToView { view: ViewName, job: JobName },
    DeleteJob { job: JobName },
    DeleteView { view: ViewName },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::CreateJob { branch, job } => write!(f, "create job '{job}' for branch '{branch}'"),
            Action::CreateView { view } => write!(f, "create view '{view}'"),
            Action::AddJobToView { view, job } => write!(f, "add job '{job}' to view '{view}'"),
            Action::DeleteJob { job } => write!(f, "delete job '{job}'"),
            Action::DeleteView { view } => write!(f, "delete view '{view}'"),
        }
    }
}

/// Ordered list of actions for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    /// Compute the plan. Pure: the same inputs always give the same plan,
    /// which is what keeps preview and live runs identical.
    pub fn build(
        naming: &NamingConvention,
        branches: &[BranchName],
        existing_jobs: &[JobName],
        existing_views: &[ViewName],
    ) -> Plan {
        let existing_job_set: HashSet<&JobName> = existing_jobs.iter().collect();
        let existing_view_set: HashSet<&ViewName> = existing_views.iter().collect();
        let mut desired_jobs: HashSet<JobName> = HashSet::new();
        let mut desired_views: HashSet<ViewName> = HashSet::new();
        let mut actions = Vec::new();

        for branch in branches {
            let job = naming.job_name(branch);
            let view = naming.view_name(branch);

            let job_is_new = !existing_job_set.contains(&job) && !desired_jobs.contains(&job);
            let view_is_new = !existing_view_set.contains(&view) && !desired_views.contains(&view);

            if job_is_new {
                actions.push(Action::CreateJob { branch: branch.clone(), job: job.clone() });
            }
            if view_is_new {
                actions.push(Action::CreateView { view: view.clone() });
            }
            if view_is_new || job_is_new {
                actions.push(Action::AddJobToView { view: view.clone(), job: job.clone() });
            }

            desired_jobs.insert(job);
            desired_views.insert(view);
        }

        let mut deleted_jobs: HashSet<&JobName> = HashSet::new();
        for job in existing_jobs {
            if !desired_jobs.contains(job) && deleted_jobs.insert(job) {
                actions.push(Action::DeleteJob { job: job.clone() });
            }
        }
        let mut deleted_views: HashSet<&ViewName> = HashSet::new();
        for view in existing_views {
            if !desired_views.contains(view) && deleted_views.insert(view) {
                actions.push(Action::DeleteView { view: view.clone() });
            }
        }

        Plan { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn jobs_to_create(&self) -> impl Iterator<Item = &JobName> {
        self.actions.iter().filter_map(|a| match a {
            Action::CreateJob { job, .. } => Some(job),
            _ => None,
        })
    }

    pub fn jobs_to_delete(&self) -> impl Iterator<Item = &JobName> {
        self.actions.iter().filter_map(|a| match a {
            Action::DeleteJob { job } => Some(job),
            _ => None,
        })
    }

    pub fn views_to_create(&self) -> impl Iterator<Item = &ViewName> {
        self.actions.iter().filter_map(|a| match a {
            Action::CreateView { view } => Some(view),
            _ => None,
        })
    }

    pub fn views_to_delete(&self) -> impl Iterator<Item = &ViewName> {
        self.actions.iter().filter_map(|a| match a {
            Action::DeleteView { view } => Some(view),
            _ => None,
        })
    }
}
