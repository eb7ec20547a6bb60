mod file_config;

pub use file_config::{FileConfig, WatchedRepoConfig};

use crate::github::CommitScope;
use anyhow::{bail, Result};
use std::path::PathBuf;

const DEFAULT_BRANCH: &str = "main";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub github_token: Option<String>,
    pub poll_interval_minutes: u64,
    pub commit_scope: CommitScope,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_dir: None,
            github_token: None,
            poll_interval_minutes: 10,
            commit_scope: CommitScope::Branch,
        }
    }
}

/// A repository watched by the commit activity job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedRepo {
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub github_token: Option<String>,
    pub poll_interval_minutes: u64,
    pub commit_scope: CommitScope,
    pub skills: Vec<String>,
    pub repos: Vec<WatchedRepo>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let github_token = file.github_token.or_else(|| cli.github_token.clone());

        let poll_interval_minutes = file
            .poll_interval_minutes
            .unwrap_or(cli.poll_interval_minutes);
        if poll_interval_minutes == 0 {
            bail!("poll_interval_minutes must be greater than zero");
        }

        let commit_scope = file.commit_scope.unwrap_or(cli.commit_scope);

        let skills = file.skills.unwrap_or_default();

        let repos = file
            .repos
            .unwrap_or_default()
            .into_iter()
            .map(|r| WatchedRepo {
                repo: r.repo,
                branch: r.branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            })
            .collect();

        Ok(Self {
            db_dir,
            github_token,
            poll_interval_minutes,
            commit_scope,
            skills,
            repos,
        })
    }

    pub fn team_db_path(&self) -> PathBuf {
        self.db_dir.join("team.db")
    }

    pub fn tasks_db_path(&self) -> PathBuf {
        self.db_dir.join("tasks.db")
    }

    pub fn state_db_path(&self) -> PathBuf {
        self.db_dir.join("state.db")
    }
}
