//! `branchsync sync` / `branchsync plan`: reconcile jobs and views.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use branchsync_core::config::Settings;
use branchsync_gateway::{GitRepository, JenkinsClient};
use branchsync_renderer::TemplateEngine;
use branchsync_sync::{Action, ReconcileOptions, ReconcileReport, Reconciler};

use super::config::ConfigArgs;

/// Arguments for `branchsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Discover and plan as usual but make no changes on the CI server.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let settings = self.config.resolve(self.dry_run)?;
        let report = reconcile(&settings)?;
        print_report(&report);
        Ok(())
    }
}

/// Arguments for `branchsync plan` (always a dry run).
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        SyncArgs { config: self.config, dry_run: true }.run()
    }
}

fn reconcile(settings: &Settings) -> Result<ReconcileReport> {
    let renderer = TemplateEngine::new(settings.template_dir.as_deref())
        .context("failed to load job templates")?;
    if !renderer.has_template(&settings.template_name) {
        bail!(
            "unknown job template '{}' (available: {})",
            settings.template_name,
            renderer.template_names().join(", ")
        );
    }

    tracing::debug!(
        jenkins = %settings.jenkins.url,
        repo = %settings.repository_path.display(),
        template = %settings.template_name,
        preview = settings.preview,
        "resolved settings"
    );

    let repo = GitRepository::open(&settings.repository_path);
    let ci = JenkinsClient::new(&settings.jenkins);
    let mut engine = Reconciler::new(ReconcileOptions::from(settings), repo, ci, renderer);
    engine
        .reconcile()
        .with_context(|| format!("reconciliation against {} failed", settings.jenkins.url))
}

fn print_report(report: &ReconcileReport) {
    let prefix = if report.preview { "[dry-run] " } else { "" };

    if report.is_noop() {
        println!(
            "{prefix}{} nothing to do ({} branch(es), {} managed job(s), {} managed view(s))",
            "✓".green(),
            report.branches.len(),
            report.existing_jobs.len(),
            report.existing_views.len(),
        );
        return;
    }

    let verb = if report.preview { "planned" } else { "applied" };
    println!(
        "{prefix}{} {} change(s) {verb} for {} branch(es)",
        "✓".green(),
        report.actions.len(),
        report.branches.len(),
    );
    for action in &report.actions {
        let marker = match action {
            Action::CreateJob { .. } | Action::CreateView { .. } => "+".green(),
            Action::AddJobToView { .. } => "~".yellow(),
            Action::DeleteJob { .. } | Action::DeleteView { .. } => "-".red(),
        };
        println!("  {marker}  {action}");
    }
}
