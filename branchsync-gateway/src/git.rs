//! Git-backed [`RepositoryGateway`].

use std::path::{Path, PathBuf};
use std::process::Command;

use branchsync_core::{
    error::GatewayError,
    gateway::{parse_ls_remote_heads, RepositoryGateway},
    types::BranchName,
};

/// Queries the `origin` remote of a local checkout.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
    remote: String,
}

impl GitRepository {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), remote: "origin".to_string() }
    }

    /// Use a remote other than `origin`.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, args: &[&str]) -> Result<String, GatewayError> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!(repo = %self.path.display(), %command, "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .map_err(|source| GatewayError::Spawn { command: command.clone(), source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GatewayError::Command { command, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RepositoryGateway for GitRepository {
    fn remote_url(&self) -> Result<String, GatewayError> {
        let url = self.git(&["remote", "get-url", &self.remote])?.trim().to_string();
        if url.is_empty() {
            return Err(GatewayError::Command {
                command: format!("git remote get-url {}", self.remote),
                stderr: "empty remote URL".to_string(),
            });
        }
        Ok(url)
    }

    fn remote_branch_names(&self) -> Result<Vec<BranchName>, GatewayError> {
        let output = self.git(&["ls-remote", "--heads", &self.remote])?;
        Ok(parse_ls_remote_heads(&output))
    }
}
