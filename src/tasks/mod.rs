mod models;
mod sqlite_task_store;

pub use models::{Priority, Progress, TaskGroup, TaskGroupDraft};
pub use sqlite_task_store::SqliteTaskStore;

use anyhow::Result;

pub trait TaskGroupStore: Send + Sync {
    /// Registers a new task group and returns its id.
    fn register_task_group(&self, draft: &TaskGroupDraft) -> Result<i64>;

    /// Returns all task groups, newest first.
    fn list_task_groups(&self) -> Result<Vec<TaskGroup>>;

    /// Updates the progress of a task group.
    /// Returns Ok(false) if no task group with that id exists.
    fn update_task_group_progress(&self, task_group_id: i64, progress: Progress) -> Result<bool>;
}
