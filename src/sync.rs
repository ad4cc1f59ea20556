//! Sync Engine - Lists repositories and mirrors them one at a time
//!
//! The listing is fully paginated before any repository is touched. Each
//! repository is then cloned (no local directory yet) or pulled (directory
//! exists), strictly in list order. Tool failures are recorded in the
//! summary but never abort the run.

use crate::config::Settings;
use crate::git::{authenticated_clone_url, GitCli, ToolStatus, Vcs};
use crate::github::{GitHubClient, ListingTarget, RepoDescriptor};
use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What was done for a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Pulled,
}

/// Result of syncing a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub full_name: String,
    pub path: PathBuf,
    pub action: SyncAction,
    /// `None` when the tool could not be started
    pub status: Option<ToolStatus>,
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        !self.status.is_some_and(|status| status.success())
    }
}

/// Results from a complete sync pass
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub cloned: usize,
    pub pulled: usize,
    pub tool_failures: usize,
    pub duration: Duration,
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncSummary {
    fn compile(outcomes: Vec<SyncOutcome>, duration: Duration) -> Self {
        let count = |action: SyncAction| outcomes.iter().filter(|o| o.action == action).count();

        Self {
            total_repositories: outcomes.len(),
            cloned: count(SyncAction::Cloned),
            pulled: count(SyncAction::Pulled),
            tool_failures: outcomes.iter().filter(|o| o.is_failure()).count(),
            duration,
            outcomes,
        }
    }
}

/// Clones or pulls repositories under an output directory
pub struct Syncer<V> {
    vcs: V,
    token: String,
    output_directory: PathBuf,
}

impl<V: Vcs> Syncer<V> {
    pub fn new(vcs: V, token: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            vcs,
            token: token.into(),
            output_directory: output_directory.into(),
        }
    }

    /// Local path for a repository's `<owner>/<name>`
    pub fn target_dir(&self, full_name: &str) -> PathBuf {
        full_name
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.output_directory.clone(), |path, segment| path.join(segment))
    }

    /// Bring one repository up to date: pull if present, clone otherwise
    pub async fn sync(&self, repo: &RepoDescriptor) -> SyncOutcome {
        let path = self.target_dir(&repo.full_name);

        let (action, result) = if path.is_dir() {
            info!("repo: update/fetch: {}", repo.full_name);
            (SyncAction::Pulled, self.vcs.pull(&path).await)
        } else {
            info!("repo: new/clone: {}", repo.full_name);

            if let Some(parent) = path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    warn!("Failed to create {}: {}", parent.display(), e);
                }
            }

            let url = authenticated_clone_url(&repo.clone_url, &self.token);
            (SyncAction::Cloned, self.vcs.clone_repository(&url, &path).await)
        };

        let status = match result {
            Ok(status) => {
                if !status.success() {
                    debug!(
                        "{:?} {} exited with {:?}",
                        action,
                        repo.full_name,
                        status.code()
                    );
                }
                Some(status)
            }
            Err(e) => {
                warn!("{}: {:#}", repo.full_name, e);
                None
            }
        };

        SyncOutcome {
            full_name: repo.full_name.clone(),
            path,
            action,
            status,
        }
    }

    /// Sync every repository sequentially, in list order
    pub async fn sync_all(&self, repositories: &[RepoDescriptor]) -> SyncSummary {
        let start_time = Instant::now();
        let mut outcomes = Vec::with_capacity(repositories.len());

        for repo in repositories {
            outcomes.push(self.sync(repo).await);
        }

        SyncSummary::compile(outcomes, start_time.elapsed())
    }
}

/// The main sync engine: list, then mirror
pub struct SyncEngine<V> {
    client: GitHubClient,
    syncer: Syncer<V>,
    target: ListingTarget,
}

impl SyncEngine<GitCli> {
    /// Build an engine that runs the configured git executable
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = GitHubClient::new(&settings.api_root, &settings.token)?;
        let git = GitCli::new(settings.git_program);
        debug!(
            "Mirroring {:?} from {} into {} using {}",
            settings.target,
            settings.api_root,
            settings.output_directory.display(),
            git.program()
        );
        let syncer = Syncer::new(git, settings.token, settings.output_directory);

        Ok(Self::new(client, syncer, settings.target))
    }
}

impl<V: Vcs> SyncEngine<V> {
    pub fn new(client: GitHubClient, syncer: Syncer<V>, target: ListingTarget) -> Self {
        Self {
            client,
            syncer,
            target,
        }
    }

    /// Run a complete pass; listing errors abort before anything is synced
    pub async fn run(&self) -> Result<SyncSummary> {
        let repositories = self.client.list_repositories(&self.target).await?;

        let summary = self.syncer.sync_all(&repositories).await;

        debug!(
            "Sync completed in {:.2}s: {} cloned, {} pulled, {} tool failures",
            summary.duration.as_secs_f64(),
            summary.cloned,
            summary.pulled,
            summary.tool_failures
        );

        Ok(summary)
    }
}
