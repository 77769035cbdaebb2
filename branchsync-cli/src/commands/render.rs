//! `branchsync render <branch>`: print the descriptor a new job would get.

use anyhow::{Context, Result};
use clap::Args;

use branchsync_core::{
    config::DEFAULT_TEMPLATE, gateway::RepositoryGateway, types::BranchName,
};
use branchsync_gateway::GitRepository;
use branchsync_renderer::{DescriptorRenderer, TemplateEngine};

use super::config::ConfigArgs;

/// Arguments for `branchsync render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Branch to render the job descriptor for.
    pub branch: String,

    /// Use this repository URL instead of reading `origin` from the checkout.
    #[arg(long, value_name = "URL")]
    pub repo_url: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let merged = self.config.merged(false)?;
        let template = merged
            .template
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

        let repo_url = match self.repo_url {
            Some(url) => url,
            None => {
                let path = merged
                    .repository_path
                    .context("set repository_path (or --repo) or pass --repo-url")?;
                GitRepository::open(&path)
                    .remote_url()
                    .with_context(|| format!("cannot read origin URL of {}", path.display()))?
            }
        };

        let engine = TemplateEngine::new(merged.template.dir.as_deref())
            .context("failed to load job templates")?;
        let descriptor = engine
            .render(&template, &repo_url, &BranchName::from(self.branch.as_str()))
            .with_context(|| format!("failed to render '{template}' for '{}'", self.branch))?;

        print!("{}", descriptor.as_str());
        if !descriptor.as_str().ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
