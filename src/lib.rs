//! gh-mirror - Mirror every GitHub repository visible to an API token
//!
//! A run lists the repositories of the token owner (or another user) by
//! following the API's `Link: rel="next"` pagination to the end, then walks
//! the list in order, cloning repositories that have no local directory yet
//! and pulling the ones that do.
//!
//! ## Modules
//!
//! - [`config`]: Optional YAML configuration and resolved run settings
//! - [`github`]: Paginated repository listing
//! - [`git`]: Version-control tool invocation
//! - [`sync`]: Clone-or-pull per repository and run orchestration

pub mod config;
pub mod git;
pub mod github;
pub mod sync;

pub use config::{Config, Settings};
pub use git::{GitCli, ToolStatus, Vcs};
pub use github::{GitHubClient, ListError, ListingTarget, RepoDescriptor};
pub use sync::{SyncAction, SyncEngine, SyncOutcome, SyncSummary, Syncer};
