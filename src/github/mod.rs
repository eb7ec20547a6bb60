mod client;
mod collector;
mod models;

pub use client::{CommitHost, GithubClient};
pub use collector::{watermark_key, CollectionFailed, CommitActivityCollector};
pub use models::{CommitActivity, CommitInfo, CommitScope};
