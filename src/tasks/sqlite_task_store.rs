use super::models::{Priority, Progress, TaskGroup, TaskGroupDraft};
use super::TaskGroupStore;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    open_versioned, Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// V 0
const TASK_GROUP_TABLE_V_0: Table = Table {
    name: "task_group",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("description", &SqlType::Text),
        sqlite_column!("priority", &SqlType::Text, non_null = true),
        sqlite_column!("progress", &SqlType::Text, non_null = true),
        sqlite_column!("deadline", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_task_group_progress", "progress")],
};

pub const TASK_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[TASK_GROUP_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned(db_path, TASK_VERSIONED_SCHEMAS)?;
        Ok(SqliteTaskStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn row_to_task_group(row: &rusqlite::Row) -> rusqlite::Result<(i64, String, Option<String>, String, String, Option<String>)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn decode_task_group(
        (id, name, description, priority, progress, deadline): (
            i64,
            String,
            Option<String>,
            String,
            String,
            Option<String>,
        ),
    ) -> Result<TaskGroup> {
        Ok(TaskGroup {
            id,
            name,
            description,
            priority: Priority::parse(&priority)
                .ok_or_else(|| anyhow!("Unknown priority value: {}", priority))?,
            progress: Progress::parse(&progress)
                .ok_or_else(|| anyhow!("Unknown progress value: {}", progress))?,
            deadline: deadline
                .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
                .transpose()?,
        })
    }
}

impl TaskGroupStore for SqliteTaskStore {
    fn register_task_group(&self, draft: &TaskGroupDraft) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO task_group (name, description, priority, progress, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.name,
                draft.description,
                draft.priority.as_str(),
                draft.progress.as_str(),
                draft.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_task_groups(&self) -> Result<Vec<TaskGroup>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, description, priority, progress, deadline
             FROM task_group ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_task_group)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode_task_group).collect()
    }

    fn update_task_group_progress(&self, task_group_id: i64, progress: Progress) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE task_group SET progress = ?1 WHERE id = ?2",
            params![progress.as_str(), task_group_id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteTaskStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let temp_file_path = temp_dir.path().join("tasks.db");
        let store = SqliteTaskStore::new(&temp_file_path).unwrap();
        (store, temp_dir)
    }

    fn draft(name: &str) -> TaskGroupDraft {
        TaskGroupDraft {
            name: name.to_string(),
            description: Some("sprint work".to_string()),
            priority: Priority::High,
            progress: Progress::Todo,
            deadline: NaiveDate::from_ymd_opt(2024, 3, 1),
        }
    }

    #[test]
    fn registers_and_lists_task_groups() {
        let (store, _temp_dir) = create_tmp_store();

        let first = store.register_task_group(&draft("api")).unwrap();
        let second = store.register_task_group(&draft("frontend")).unwrap();
        assert!(second > first);

        let groups = store.list_task_groups().unwrap();
        assert_eq!(groups.len(), 2);
        // Newest first
        assert_eq!(groups[0].name, "frontend");
        assert_eq!(groups[1].name, "api");
        assert_eq!(groups[0].priority, Priority::High);
        assert_eq!(groups[0].deadline, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn updates_progress() {
        let (store, _temp_dir) = create_tmp_store();
        let id = store.register_task_group(&draft("api")).unwrap();

        assert!(store
            .update_task_group_progress(id, Progress::InProgress)
            .unwrap());

        let groups = store.list_task_groups().unwrap();
        assert_eq!(groups[0].progress, Progress::InProgress);

        assert!(!store
            .update_task_group_progress(999, Progress::Done)
            .unwrap());
    }

    #[test]
    fn deadline_is_optional() {
        let (store, _temp_dir) = create_tmp_store();
        let mut d = draft("api");
        d.deadline = None;
        store.register_task_group(&d).unwrap();

        let groups = store.list_task_groups().unwrap();
        assert!(groups[0].deadline.is_none());
    }
}
