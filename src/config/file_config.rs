use crate::github::CommitScope;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub github_token: Option<String>,
    pub poll_interval_minutes: Option<u64>,
    pub commit_scope: Option<CommitScope>,

    /// Skill catalog seed; missing names are inserted at startup.
    pub skills: Option<Vec<String>>,

    /// Repositories polled by the commit activity job.
    pub repos: Option<Vec<WatchedRepoConfig>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatchedRepoConfig {
    /// "owner/name" repository identifier.
    pub repo: String,
    /// Branch whose tip anchors each collection run. Defaults to "main".
    pub branch: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
