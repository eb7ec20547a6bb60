use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Todo,
    InProgress,
    Done,
}

impl Progress {
    pub fn as_str(&self) -> &'static str {
        match self {
            Progress::Todo => "todo",
            Progress::InProgress => "in_progress",
            Progress::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Progress::Todo),
            "in_progress" => Some(Progress::InProgress),
            "done" => Some(Progress::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub progress: Progress,
    pub deadline: Option<NaiveDate>,
}

/// The fields supplied when registering a task group.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskGroupDraft {
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub progress: Progress,
    pub deadline: Option<NaiveDate>,
}
