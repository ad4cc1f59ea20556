use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command as AsyncCommand;

const HTTPS_SCHEME: &str = "https://";

/// Exit status of a version-control tool invocation
///
/// Recorded for reporting only; a failing clone or pull never stops a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    code: Option<i32>,
}

impl ToolStatus {
    /// `None` means the process was killed by a signal
    pub fn from_code(code: Option<i32>) -> Self {
        Self { code }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ToolStatus {
    fn from(status: ExitStatus) -> Self {
        Self::from_code(status.code())
    }
}

/// Version-control operations needed to mirror a repository
///
/// An `Err` means the tool could not be started at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Clone `url` into `destination`
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<ToolStatus>;

    /// Pull the current branch of the working copy at `working_dir`
    async fn pull(&self, working_dir: &Path) -> Result<ToolStatus>;
}

/// Runs the `git` command line tool
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_repository(&self, url: &str, destination: &Path) -> Result<ToolStatus> {
        let status = AsyncCommand::new(&self.program)
            .args(["clone", url])
            .arg(destination)
            .status()
            .await
            .with_context(|| format!("Failed to execute {} clone", self.program))?;

        Ok(status.into())
    }

    async fn pull(&self, working_dir: &Path) -> Result<ToolStatus> {
        let status = AsyncCommand::new(&self.program)
            .arg("pull")
            .current_dir(working_dir)
            .status()
            .await
            .with_context(|| format!("Failed to execute {} pull", self.program))?;

        Ok(status.into())
    }
}

/// Embed `token` as the userinfo of an HTTPS clone URL
///
/// `https://github.com/o/r.git` becomes `https://<token>@github.com/o/r.git`.
/// Other schemes are returned unchanged.
pub fn authenticated_clone_url(clone_url: &str, token: &str) -> String {
    clone_url.replacen(HTTPS_SCHEME, &format!("{}{}@", HTTPS_SCHEME, token), 1)
}
