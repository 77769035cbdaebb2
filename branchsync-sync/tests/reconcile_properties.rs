//! End-to-end reconciliation properties against the in-memory CI mirror.

use std::collections::BTreeSet;

use branchsync_core::{
    naming::NamingConvention,
    types::{BranchName, JobName, ViewName},
};
use branchsync_renderer::TemplateEngine;
use branchsync_sync::{
    fakes::{CiCall, MemoryCi, MemoryRepo, StubRenderer},
    Action, ReconcileOptions, Reconciler,
};
use rstest::rstest;

fn naming() -> NamingConvention {
    NamingConvention::new("ci-", "-job", "view-", "")
}

fn options(preview: bool) -> ReconcileOptions {
    ReconcileOptions { naming: naming(), template: "job.xml.tera".to_string(), preview }
}

fn run(ci: &mut MemoryCi, repo: &MemoryRepo, preview: bool) -> Vec<Action> {
    Reconciler::new(options(preview), repo, ci, StubRenderer::default())
        .reconcile()
        .expect("reconcile")
        .actions
}

fn managed_jobs(ci: &MemoryCi) -> BTreeSet<String> {
    let n = naming();
    ci.job_names().into_iter().filter(|j| n.is_managed_job(j)).collect()
}

fn managed_views(ci: &MemoryCi) -> BTreeSet<String> {
    let n = naming();
    ci.view_names().into_iter().filter(|v| n.is_managed_view(v)).collect()
}

fn expected_jobs(branches: &[&str]) -> BTreeSet<String> {
    branches.iter().map(|b| naming().job_name(&BranchName::from(*b)).0).collect()
}

fn expected_views(branches: &[&str]) -> BTreeSet<String> {
    branches.iter().map(|b| naming().view_name(&BranchName::from(*b)).0).collect()
}

// ---------------------------------------------------------------------------
// 1. Convergence + idempotence
// ---------------------------------------------------------------------------

#[rstest]
#[case(&[], &[], &[])]
#[case(&["main"], &[], &[])]
#[case(&["main", "release-1", "feature/login"], &["ci-main-job"], &["view-main"])]
#[case(&[], &["ci-a-job", "ci-b-job"], &["view-a", "view-c"])]
#[case(&["a"], &["ci-b-job"], &["view-a"])]
#[case(&["a", "b"], &["ci-a-job", "ci-b-job"], &["view-a", "view-b"])]
fn reconcile_converges_and_is_idempotent(
    #[case] branches: &[&str],
    #[case] jobs: &[&str],
    #[case] views: &[&str],
) {
    let mut ci = MemoryCi::new()
        .with_jobs(jobs)
        .with_jobs(&["deploy-prod", "nightly"])
        .with_views(views)
        .with_views(&["all"]);
    let repo = MemoryRepo::new("git@host:app.git", branches);

    run(&mut ci, &repo, false);
    assert_eq!(managed_jobs(&ci), expected_jobs(branches));
    assert_eq!(managed_views(&ci), expected_views(branches));
    assert!(ci.has_job("deploy-prod") && ci.has_job("nightly"), "foreign jobs untouched");
    assert!(ci.view_names().contains("all"), "foreign views untouched");

    for branch in branches {
        let view = naming().view_name(&BranchName::from(*branch));
        let job = naming().job_name(&BranchName::from(*branch));
        let members = ci.jobs_in_view(view.as_str()).expect("view exists");
        assert!(
            members.contains(&job) || jobs.contains(&job.as_str()) && views.contains(&view.as_str()),
            "new view/job pair must be linked: {view} / {job}"
        );
    }

    ci.clear_calls();
    let second = run(&mut ci, &repo, false);
    assert!(second.is_empty(), "second run planned {second:?}");
    assert!(ci.mutations().is_empty());
}

#[test]
fn branch_churn_converges_across_runs() {
    let mut ci = MemoryCi::new();
    let mut repo = MemoryRepo::new("u", &["main", "dev"]);
    run(&mut ci, &repo, false);

    repo.set_branches(&["main", "hotfix"]);
    let actions = run(&mut ci, &repo, false);
    assert_eq!(
        actions,
        vec![
            Action::CreateJob { branch: BranchName::from("hotfix"), job: JobName::from("ci-hotfix-job") },
            Action::CreateView { view: ViewName::from("view-hotfix") },
            Action::AddJobToView { view: ViewName::from("view-hotfix"), job: JobName::from("ci-hotfix-job") },
            Action::DeleteJob { job: JobName::from("ci-dev-job") },
            Action::DeleteView { view: ViewName::from("view-dev") },
        ]
    );
    assert_eq!(managed_jobs(&ci), expected_jobs(&["main", "hotfix"]));
}

// ---------------------------------------------------------------------------
// 2. Preview
// ---------------------------------------------------------------------------

#[rstest]
#[case(&["main", "release-1"])]
#[case(&[])]
#[case(&["only-new"])]
fn preview_issues_no_mutations_and_matches_live(#[case] branches: &[&str]) {
    let seed = || {
        MemoryCi::new()
            .with_jobs(&["ci-main-job", "ci-feature-x-job", "deploy"])
            .with_views(&["view-feature-x", "all"])
    };
    let repo = MemoryRepo::new("u", branches);

    let mut preview_ci = seed();
    let previewed = run(&mut preview_ci, &repo, true);
    assert!(preview_ci.mutations().is_empty());
    assert_eq!(preview_ci.job_names(), seed().job_names());
    assert_eq!(preview_ci.view_names(), seed().view_names());

    let mut live_ci = seed();
    let applied = run(&mut live_ci, &repo, false);
    assert_eq!(previewed, applied);
}

#[test]
fn preview_still_reads_the_server() {
    let mut ci = MemoryCi::new();
    let repo = MemoryRepo::new("u", &["main"]);
    run(&mut ci, &repo, true);
    assert_eq!(ci.reads(), 2);
}

// ---------------------------------------------------------------------------
// 3. Scenarios
// ---------------------------------------------------------------------------

#[test]
fn stale_job_is_deleted_and_missing_job_created() {
    let mut ci = MemoryCi::new()
        .with_jobs(&["ci-main-job", "ci-feature-x-job"])
        .with_views(&["view-main", "view-release-1"]);
    let repo = MemoryRepo::new("u", &["main", "release-1"]);

    let actions = run(&mut ci, &repo, false);
    let creates: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::CreateJob { job, .. } => Some(job.as_str()),
            _ => None,
        })
        .collect();
    let deletes: Vec<_> = actions
        .iter()
        .filter_map(|a| match a {
            Action::DeleteJob { job } => Some(job.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(creates, vec!["ci-release-1-job"]);
    assert_eq!(deletes, vec!["ci-feature-x-job"]);
    assert!(!ci.mutations().iter().any(|c| match c {
        CiCall::CreateJob(j) | CiCall::DeleteJob(j) => j.as_str() == "ci-main-job",
        _ => false,
    }));
}

#[test]
fn existing_view_gets_new_job_without_recreation() {
    let mut ci = MemoryCi::new().with_views(&["view-dev"]);
    let repo = MemoryRepo::new("u", &["dev"]);

    run(&mut ci, &repo, false);
    assert_eq!(
        ci.mutations(),
        &[
            CiCall::CreateJob(JobName::from("ci-dev-job")),
            CiCall::AddJobToView(ViewName::from("view-dev"), JobName::from("ci-dev-job")),
        ]
    );
    assert!(ci.jobs_in_view("view-dev").unwrap().contains(&JobName::from("ci-dev-job")));
}

#[test]
fn unanchored_match_makes_lookalike_jobs_managed() {
    let mut ci = MemoryCi::new().with_jobs(&["old-ci-legacy-job-archive", "ci-nightly"]);
    let repo = MemoryRepo::new("u", &[]);
    run(&mut ci, &repo, false);
    assert!(!ci.has_job("old-ci-legacy-job-archive"));
    assert!(ci.has_job("ci-nightly"));
}

// ---------------------------------------------------------------------------
// 4. Real renderer
// ---------------------------------------------------------------------------

#[test]
fn embedded_template_descriptor_reaches_the_server() {
    let mut ci = MemoryCi::new();
    let repo = MemoryRepo::new("https://git.example.com/acme/app.git", &["release-2"]);
    let engine = TemplateEngine::new(None).expect("engine");

    Reconciler::new(options(false), &repo, &mut ci, &engine)
        .reconcile()
        .expect("reconcile");

    let xml = ci.descriptor("ci-release-2-job").expect("job").as_str().to_string();
    assert!(xml.contains("<url>https://git.example.com/acme/app.git</url>"));
    assert!(xml.contains("<name>refs/heads/release-2</name>"));
}
