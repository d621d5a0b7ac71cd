//! Git operations used by the deploy scenario
//!
//! Run as child processes; a non-zero exit fails the scenario.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::{Error, Result};

/// Header that asks the platform for a hot upgrade
pub const HOT_UPGRADE_HEADER: &str = "http.extraheader=GIGALIXIR-HOT:true";

/// Whether a push restarts running processes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushMode {
    Cold,
    Hot,
}

/// Version control operations
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Clone `url` into `parent`, returning the checkout directory
    async fn clone_repo(&self, url: &str, parent: &Path) -> Result<PathBuf>;

    async fn push(&self, repo: &Path, remote: &str, branch: &str, mode: PushMode) -> Result<()>;

    async fn rebase(&self, repo: &Path, onto: &str) -> Result<()>;
}

/// Directory name git clones `url` into
pub fn repo_dir_name(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

/// Arguments for `git push`
pub fn push_args(remote: &str, branch: &str, mode: PushMode) -> Vec<String> {
    let mut args = Vec::new();
    if mode == PushMode::Hot {
        args.push("-c".to_string());
        args.push(HOT_UPGRADE_HEADER.to_string());
    }
    args.extend(["push".to_string(), remote.to_string(), branch.to_string()]);
    args
}

/// System `git`
#[derive(Debug, Clone)]
pub struct GitCli {
    home: PathBuf,
    verbose: bool,
}

impl GitCli {
    /// `home` is exported as `HOME` so git picks up the credentials the
    /// gigalixir CLI wrote there
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            verbose: false,
        }
    }

    /// Stream git's output to the terminal
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    async fn git(&self, cwd: &Path, args: &[String]) -> Result<()> {
        let shown = format!("git {}", args.join(" "));
        tracing::info!("$ {shown}");

        let status = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("HOME", &self.home)
            .stdin(Stdio::null())
            .stdout(if self.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .stderr(if self.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .status()
            .await
            .map_err(|e| Error::Spawn {
                program: "git".to_string(),
                source: e,
            })?;

        if !status.success() {
            return Err(Error::ShellCommand {
                command: shown,
                code: status.code(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_repo(&self, url: &str, parent: &Path) -> Result<PathBuf> {
        self.git(parent, &["clone".to_string(), url.to_string()])
            .await?;
        Ok(parent.join(repo_dir_name(url)))
    }

    async fn push(&self, repo: &Path, remote: &str, branch: &str, mode: PushMode) -> Result<()> {
        self.git(repo, &push_args(remote, branch, mode)).await
    }

    async fn rebase(&self, repo: &Path, onto: &str) -> Result<()> {
        self.git(repo, &["rebase".to_string(), onto.to_string()])
            .await
    }
}
