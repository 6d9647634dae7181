//! Aggregate analysis over a task list
//!
//! Consumes either the whole store or a pre-filtered search result.
//! `now` is an explicit argument so two calls over the same data give
//! the same answer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Task, TaskStatus};
use crate::timing::{self, EstimateAccuracy};

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Per-task estimate variance, present only where the variance is defined
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskVariance {
    pub id: String,
    pub title: String,
    pub estimated_minutes: i64,
    pub actual_minutes: i64,
    pub difference_minutes: i64,
    pub accuracy: EstimateAccuracy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalysis {
    pub total: usize,
    pub status_counts: StatusCounts,
    /// Active tasks whose due date has passed
    pub overdue: usize,
    /// Frequency per tag, in first-seen order
    pub tag_distribution: Vec<TagCount>,
    /// Mean work duration of completed tasks, in hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_completion_hours: Option<f64>,
    /// Mean estimate variance over tasks where it is defined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_time_difference_minutes: Option<f64>,
    pub variances: Vec<TaskVariance>,
}

pub fn analyze(tasks: &[Task], now: DateTime<Utc>) -> TaskAnalysis {
    let mut status_counts = StatusCounts::default();
    let mut overdue = 0;
    let mut tag_distribution: Vec<TagCount> = Vec::new();
    let mut completion_minutes: Vec<i64> = Vec::new();
    let mut variances: Vec<TaskVariance> = Vec::new();

    for task in tasks {
        match task.status {
            TaskStatus::Pending => status_counts.pending += 1,
            TaskStatus::InProgress => status_counts.in_progress += 1,
            TaskStatus::Completed => status_counts.completed += 1,
            TaskStatus::Cancelled => status_counts.cancelled += 1,
        }

        if task.is_overdue(now) {
            overdue += 1;
        }

        for tag in &task.tags {
            match tag_distribution.iter_mut().find(|entry| entry.tag == *tag) {
                Some(entry) => entry.count += 1,
                None => tag_distribution.push(TagCount {
                    tag: tag.clone(),
                    count: 1,
                }),
            }
        }

        if task.actual_completion_date.is_some() {
            completion_minutes.push(timing::work_duration_minutes(task));
        }

        if let Some(difference) = timing::time_difference_minutes(task) {
            let estimated = timing::estimated_total_minutes(task);
            variances.push(TaskVariance {
                id: task.id.clone(),
                title: task.title.clone(),
                estimated_minutes: estimated,
                actual_minutes: timing::work_duration_minutes(task),
                difference_minutes: difference,
                accuracy: timing::classify(difference, estimated),
                completed_at: task.actual_completion_date,
            });
        }
    }

    let average_completion_hours = mean(&completion_minutes).map(|minutes| minutes / 60.0);
    let differences: Vec<i64> = variances
        .iter()
        .map(|entry| entry.difference_minutes)
        .collect();
    let average_time_difference_minutes = mean(&differences);

    TaskAnalysis {
        total: tasks.len(),
        status_counts,
        overdue,
        tag_distribution,
        average_completion_hours,
        average_time_difference_minutes,
        variances,
    }
}

fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}
