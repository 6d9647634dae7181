//! Task and step data model
//!
//! Tasks persist as one JSON document (`{ "tasks": [...] }`) with
//! camelCase field names. The status enum carries its own transition
//! methods so illegal moves are refused where they happen instead of
//! by scattered string checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Valid priority range, 1 = highest
pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<TaskStatus> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" | "canceled" => Ok(TaskStatus::Cancelled),
            other => Err(Error::InvalidArgument(format!(
                "unknown task status '{other}'"
            ))),
        }
    }

    /// Transition taken by the dedicated start operation.
    ///
    /// Only a pending task can be started.
    pub fn start(self) -> Result<TaskStatus> {
        match self {
            TaskStatus::Pending => Ok(TaskStatus::InProgress),
            other => Err(Error::StateTransition {
                action: "start".to_string(),
                from: other.as_str().to_string(),
            }),
        }
    }

    /// Transition taken by the dedicated complete operation.
    ///
    /// Pending and in-progress tasks complete; completing an already
    /// completed task is allowed (the caller refreshes the completion
    /// timestamp). A cancelled task stays cancelled.
    pub fn complete(self) -> Result<TaskStatus> {
        match self {
            TaskStatus::Pending | TaskStatus::InProgress | TaskStatus::Completed => {
                Ok(TaskStatus::Completed)
            }
            TaskStatus::Cancelled => Err(Error::StateTransition {
                action: "complete".to_string(),
                from: self.as_str().to_string(),
            }),
        }
    }

    /// Transition taken when all steps of a completed task are reset.
    pub fn reopen(self) -> TaskStatus {
        match self {
            TaskStatus::Completed => TaskStatus::InProgress,
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sub-unit of a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    pub order: u32,
    /// Planned duration in minutes, positive when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<u32>,
}

/// A work item with ordered steps, tags, schedule fields, and a status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// First-seen order preserved; duplicates are not filtered here
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_completion_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    /// 1 = highest .. 5 = lowest
    #[serde(default = "default_priority")]
    pub priority: u8,
}

impl Task {
    /// Share of completed steps, as 0..=100. Step-less tasks report 0.
    pub fn completion_percent(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        let done = self.steps.iter().filter(|step| step.completed).count();
        done as f64 / self.steps.len() as f64 * 100.0
    }

    pub fn all_steps_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|step| step.completed)
    }

    /// Overdue means the due date has passed and the task is still active
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now && !self.status.is_terminal(),
            None => false,
        }
    }
}

/// Step payload accepted by task creation and step addition
#[derive(Debug, Clone, Default)]
pub struct NewStep {
    pub description: String,
    pub order: Option<u32>,
    pub estimated_time: Option<u32>,
    pub completed: Option<bool>,
}

/// Fields accepted by the task creation operation
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub steps: Vec<NewStep>,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub planned_start_date: Option<DateTime<Utc>>,
    pub priority: Option<u8>,
}

/// Partial update merged into a task by the generic update operation
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<u8>,
    pub due_date: Option<DateTime<Utc>>,
    pub planned_start_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

/// Partial update merged into a single step
#[derive(Debug, Clone, Default)]
pub struct StepUpdate {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<u32>,
    pub estimated_time: Option<u32>,
}

/// Conjunctive search filter; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// Task must carry every listed tag
    pub tags: Vec<String>,
    pub priority: Option<u8>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
    pub planned_from: Option<DateTime<Utc>>,
    pub planned_to: Option<DateTime<Utc>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring over title, description, step descriptions
    pub text: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if !self.tags.iter().all(|tag| task.tags.contains(tag)) {
            return false;
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if !in_range(task.due_date, self.due_from, self.due_to) {
            return false;
        }
        if !in_range(task.planned_start_date, self.planned_from, self.planned_to) {
            return false;
        }
        if !in_range(Some(task.created_at), self.created_from, self.created_to) {
            return false;
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
                || task
                    .steps
                    .iter()
                    .any(|step| step.description.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

// Range bounds are inclusive; a field with no value fails any bounded range.
fn in_range(
    value: Option<DateTime<Utc>>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    if let Some(from) = from {
        if value < from {
            return false;
        }
    }
    if let Some(to) = to {
        if value > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        Task {
            id: "task-1".to_string(),
            title: "Write parser".to_string(),
            description: "Tokenizer first".to_string(),
            steps: vec![
                Step {
                    id: "step-1".to_string(),
                    description: "design".to_string(),
                    completed: true,
                    order: 1,
                    estimated_time: Some(30),
                },
                Step {
                    id: "step-2".to_string(),
                    description: "code".to_string(),
                    completed: false,
                    order: 2,
                    estimated_time: Some(60),
                },
            ],
            tags: vec!["compiler".to_string(), "rust".to_string()],
            created_at: at,
            updated_at: at,
            due_date: None,
            planned_start_date: None,
            actual_start_date: None,
            actual_completion_date: None,
            status: TaskStatus::Pending,
            priority: 2,
        }
    }

    #[test]
    fn start_only_from_pending() {
        assert_eq!(TaskStatus::Pending.start().unwrap(), TaskStatus::InProgress);
        for status in [
            TaskStatus::InProgress,
            TaskStatus::Completed,
            TaskStatus::Cancelled,
        ] {
            let err = status.start().expect_err("must refuse");
            assert!(matches!(err, Error::StateTransition { .. }));
        }
    }

    #[test]
    fn complete_skips_explicit_start() {
        assert_eq!(
            TaskStatus::Pending.complete().unwrap(),
            TaskStatus::Completed
        );
        assert_eq!(
            TaskStatus::InProgress.complete().unwrap(),
            TaskStatus::Completed
        );
        // Re-completion is allowed; the manager refreshes the timestamp.
        assert_eq!(
            TaskStatus::Completed.complete().unwrap(),
            TaskStatus::Completed
        );
        assert!(TaskStatus::Cancelled.complete().is_err());
    }

    #[test]
    fn reopen_only_affects_completed() {
        assert_eq!(TaskStatus::Completed.reopen(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::Pending.reopen(), TaskStatus::Pending);
        assert_eq!(TaskStatus::Cancelled.reopen(), TaskStatus::Cancelled);
    }

    #[test]
    fn completion_percent_counts_steps() {
        let task = sample_task();
        assert_eq!(task.completion_percent(), 50.0);

        let mut stepless = sample_task();
        stepless.steps.clear();
        assert_eq!(stepless.completion_percent(), 0.0);
    }

    #[test]
    fn overdue_requires_active_status() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut task = sample_task();
        task.due_date = Some(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap());
        assert!(task.is_overdue(now));

        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(now));
        task.status = TaskStatus::Cancelled;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn filter_requires_every_tag() {
        let task = sample_task();
        let filter = TaskFilter {
            tags: vec!["compiler".to_string(), "rust".to_string()],
            ..TaskFilter::default()
        };
        assert!(filter.matches(&task));

        let filter = TaskFilter {
            tags: vec!["compiler".to_string(), "urgent".to_string()],
            ..TaskFilter::default()
        };
        assert!(!filter.matches(&task));
    }

    #[test]
    fn filter_text_reaches_step_descriptions() {
        let task = sample_task();
        let filter = TaskFilter {
            text: Some("CODE".to_string()),
            ..TaskFilter::default()
        };
        assert!(filter.matches(&task));

        let filter = TaskFilter {
            text: Some("deploy".to_string()),
            ..TaskFilter::default()
        };
        assert!(!filter.matches(&task));
    }

    #[test]
    fn filter_date_range_is_inclusive() {
        let task = sample_task();
        let filter = TaskFilter {
            created_from: Some(task.created_at),
            created_to: Some(task.created_at),
            ..TaskFilter::default()
        };
        assert!(filter.matches(&task));
    }

    #[test]
    fn bounded_due_range_excludes_tasks_without_due_date() {
        let task = sample_task();
        let filter = TaskFilter {
            due_from: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..TaskFilter::default()
        };
        assert!(!filter.matches(&task));
    }

    #[test]
    fn document_fields_serialize_camel_case() {
        let task = sample_task();
        let value = serde_json::to_value(&task).expect("serialize");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("actualStartDate").is_none());
        assert_eq!(value["status"], "pending");
        assert_eq!(value["steps"][0]["estimatedTime"], 30);
    }
}
