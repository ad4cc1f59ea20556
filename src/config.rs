use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::github::{ListingTarget, DEFAULT_API_ROOT};

/// Optional file-based defaults for gh-mirror
///
/// Every field can also be given on the command line, which takes precedence.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// GitHub API root (change for GitHub Enterprise)
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// List this user's repositories instead of the token owner's
    ///
    /// Applies whenever `--user` is not given, so a `user` in the default
    /// config file changes what a plain `gh-mirror <TOKEN>` lists.
    #[serde(default)]
    pub user: Option<String>,

    /// Root directory for local copies
    #[serde(default = "default_output_directory")]
    pub output_directory: String,

    /// Version-control executable to run
    #[serde(default = "default_git_program")]
    pub git_program: String,
}

/// Fully resolved settings for one mirroring run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub token: String,
    pub target: ListingTarget,
    pub output_directory: PathBuf,
    pub api_root: String,
    pub git_program: String,
}

fn default_api_root() -> String {
    DEFAULT_API_ROOT.to_string()
}
fn default_output_directory() -> String {
    ".".to_string()
}
fn default_git_program() -> String {
    "git".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            user: None,
            output_directory: default_output_directory(),
            git_program: default_git_program(),
        }
    }
}

impl Config {
    /// Load the default configuration file if present, otherwise use defaults
    ///
    /// Never creates a file.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("gh-mirror").join("config.yml"))
    }

    /// Expand `~` and environment variables in path settings
    pub fn expand_paths(&mut self) -> Result<()> {
        self.output_directory = shellexpand::full(&self.output_directory)
            .context("Failed to expand output_directory path")?
            .into_owned();

        self.git_program = shellexpand::full(&self.git_program)
            .context("Failed to expand git_program path")?
            .into_owned();

        Ok(())
    }

    /// Merge command line values over this configuration
    pub fn into_settings(
        self,
        token: String,
        user: Option<String>,
        output_directory: Option<PathBuf>,
        api_root: Option<String>,
    ) -> Settings {
        if user.is_none() {
            if let Some(name) = &self.user {
                debug!("No --user given, listing {} from the config file", name);
            }
        }

        Settings {
            token,
            target: ListingTarget::from_user(user.or(self.user)),
            output_directory: output_directory
                .unwrap_or_else(|| PathBuf::from(self.output_directory)),
            api_root: api_root.unwrap_or(self.api_root),
            git_program: self.git_program,
        }
    }
}
