use anyhow::{Context, Result};
use clap::Parser;
use crewline_server::background_jobs::jobs::CommitActivityJob;
use crewline_server::background_jobs::{BackgroundJobRunner, JobContext};
use crewline_server::config::{AppConfig, CliConfig, FileConfig};
use crewline_server::github::{CommitActivityCollector, CommitScope, GithubClient};
use crewline_server::state_store::SqliteStateStore;
use crewline_server::user::{SkillCatalogStore, SqliteTeamStore};
use crewline_server::{SqliteTaskStore, TaskGroupStore};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database files.
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// Path to a TOML config file. Values there override CLI flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// GitHub access token used by the commit activity collector.
    #[clap(long)]
    pub github_token: Option<String>,

    /// Minutes between commit activity collection runs.
    #[clap(long, default_value_t = 10)]
    pub poll_interval_minutes: u64,

    /// Commit history scope walked after resolving the branch tip.
    #[clap(long, default_value = "branch")]
    pub commit_scope: CommitScope,
}

/// Inserts configured skills that are not yet in the catalog.
fn seed_skill_catalog(team_store: &SqliteTeamStore, skills: &[String]) -> Result<()> {
    if skills.is_empty() {
        return Ok(());
    }

    let known: HashSet<String> = team_store
        .list_all_skills()?
        .into_iter()
        .map(|skill| skill.name)
        .collect();

    let mut added = 0;
    for name in skills {
        if !known.contains(name) {
            team_store.add_skill(name)?;
            added += 1;
        }
    }
    if added > 0 {
        info!("Seeded {} new skill(s) into the catalog", added);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "crewline-server {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli_config = CliConfig {
        db_dir: Some(cli_args.db_dir),
        github_token: cli_args.github_token,
        poll_interval_minutes: cli_args.poll_interval_minutes,
        commit_scope: cli_args.commit_scope,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite team database at {:?}...", config.team_db_path());
    let team_store = Arc::new(SqliteTeamStore::new(config.team_db_path())?);
    seed_skill_catalog(&team_store, &config.skills)?;

    info!("Opening SQLite task database at {:?}...", config.tasks_db_path());
    let task_store = Arc::new(SqliteTaskStore::new(config.tasks_db_path())?);
    info!(
        "Tracking {} task group(s)",
        task_store.list_task_groups()?.len()
    );

    let state_store = Arc::new(SqliteStateStore::new(config.state_db_path())?);

    let cancellation_token = CancellationToken::new();
    let mut job_handles = Vec::new();

    match (&config.github_token, config.repos.is_empty()) {
        (Some(token), false) => {
            let host = Arc::new(GithubClient::new(token)?);
            let collector = Arc::new(CommitActivityCollector::new(
                host,
                state_store.clone(),
                config.commit_scope,
            ));

            let mut runner =
                BackgroundJobRunner::new(JobContext::new(cancellation_token.clone(), collector));
            runner.register(Arc::new(CommitActivityJob::new(
                config.repos.clone(),
                config.poll_interval_minutes,
            )));
            job_handles = runner.spawn_all();

            info!(
                "Polling {} repositories every {} minute(s)",
                config.repos.len(),
                config.poll_interval_minutes
            );
        }
        (None, false) => {
            warn!("Repositories configured but no GitHub token set; commit polling disabled");
        }
        _ => {
            info!("No repositories configured; commit polling disabled");
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down...");
    cancellation_token.cancel();
    for handle in job_handles {
        let _ = handle.await;
    }

    Ok(())
}
