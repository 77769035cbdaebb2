//! Config-related flags shared by `sync`, `plan` and `render`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use branchsync_core::config::{self, ConfigFile, Overrides, Settings};

/// Config file location plus per-field overrides. Flags win over the file.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file (default: ~/.branchsync/config.yaml, if present).
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Jenkins base URL, e.g. https://ci.example.com.
    #[arg(long, value_name = "URL")]
    pub jenkins_url: Option<String>,

    /// Jenkins user name.
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Jenkins password or API token.
    #[arg(long, env = "BRANCHSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// HTTP timeout for Jenkins calls, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Local checkout whose `origin` remote is inspected.
    #[arg(long = "repo", value_name = "PATH")]
    pub repository_path: Option<PathBuf>,

    /// Job template name.
    #[arg(long = "template", value_name = "NAME")]
    pub template_name: Option<String>,

    /// Directory of additional `.tera` job templates.
    #[arg(long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,

    #[arg(long)]
    pub job_prefix: Option<String>,

    #[arg(long)]
    pub job_suffix: Option<String>,

    #[arg(long)]
    pub view_prefix: Option<String>,

    /// Never appended to new views, so anything but an empty value is rejected.
    #[arg(long)]
    pub view_suffix: Option<String>,
}

impl ConfigArgs {
    /// Load the file and apply flag overrides, without validation.
    pub fn merged(self, preview: bool) -> Result<ConfigFile> {
        let file = config::load(self.config.as_deref()).context("failed to load config")?;
        let overrides = Overrides {
            jenkins_url: self.jenkins_url,
            username: self.username,
            password: self.password,
            timeout_secs: self.timeout,
            repository_path: self.repository_path,
            template_name: self.template_name,
            template_dir: self.template_dir,
            job_prefix: self.job_prefix,
            job_suffix: self.job_suffix,
            view_prefix: self.view_prefix,
            view_suffix: self.view_suffix,
            preview,
        };
        Ok(file.merge(overrides))
    }

    /// Load, merge and validate.
    pub fn resolve(self, preview: bool) -> Result<Settings> {
        let merged = self.merged(preview)?;
        Settings::validate(merged).context("invalid configuration")
    }
}
