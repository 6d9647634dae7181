//! Time analytics over a single task
//!
//! Pure functions; every aggregate and report figure derives from
//! these. Durations are whole minutes, truncated toward zero.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::Task;

/// Relative variance at or below this ratio counts as accurate
pub const ACCURACY_TOLERANCE: f64 = 0.20;

/// How an estimate compared to the actual duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateAccuracy {
    Accurate,
    Underestimated,
    Overestimated,
}

impl EstimateAccuracy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateAccuracy::Accurate => "accurate",
            EstimateAccuracy::Underestimated => "underestimated",
            EstimateAccuracy::Overestimated => "overestimated",
        }
    }
}

/// The instant work is measured from: actual start if recorded,
/// otherwise creation.
pub fn start_reference(task: &Task) -> DateTime<Utc> {
    task.actual_start_date.unwrap_or(task.created_at)
}

/// Minutes between the start reference and completion.
///
/// An uncompleted task reports 0, never a partial elapsed figure.
pub fn work_duration_minutes(task: &Task) -> i64 {
    match task.actual_completion_date {
        Some(done) => (done - start_reference(task)).num_minutes(),
        None => 0,
    }
}

/// Sum of positive step estimates, in minutes
pub fn estimated_total_minutes(task: &Task) -> i64 {
    task.steps
        .iter()
        .filter_map(|step| step.estimated_time)
        .filter(|minutes| *minutes > 0)
        .map(i64::from)
        .sum()
}

/// Actual minus estimated minutes; positive means the task overran.
///
/// Defined only when the task both carries a positive estimate and
/// has actually completed.
pub fn time_difference_minutes(task: &Task) -> Option<i64> {
    if task.actual_completion_date.is_none() {
        return None;
    }
    let estimated = estimated_total_minutes(task);
    if estimated <= 0 {
        return None;
    }
    Some(work_duration_minutes(task) - estimated)
}

/// Classify a variance against its estimate
pub fn classify(difference_minutes: i64, estimated_minutes: i64) -> EstimateAccuracy {
    let ratio = difference_minutes as f64 / estimated_minutes as f64;
    if ratio.abs() <= ACCURACY_TOLERANCE {
        EstimateAccuracy::Accurate
    } else if ratio > 0.0 {
        EstimateAccuracy::Underestimated
    } else {
        EstimateAccuracy::Overestimated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Step, TaskStatus};
    use chrono::{Duration, TimeZone};

    fn base_task() -> Task {
        let created = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        Task {
            id: "task-1".to_string(),
            title: "T".to_string(),
            description: "d".to_string(),
            steps: Vec::new(),
            tags: Vec::new(),
            created_at: created,
            updated_at: created,
            due_date: None,
            planned_start_date: None,
            actual_start_date: None,
            actual_completion_date: None,
            status: TaskStatus::Pending,
            priority: 3,
        }
    }

    fn step(id: &str, estimate: Option<u32>) -> Step {
        Step {
            id: id.to_string(),
            description: id.to_string(),
            completed: false,
            order: 1,
            estimated_time: estimate,
        }
    }

    #[test]
    fn start_reference_prefers_actual_start() {
        let mut task = base_task();
        assert_eq!(start_reference(&task), task.created_at);

        let started = task.created_at + Duration::hours(2);
        task.actual_start_date = Some(started);
        assert_eq!(start_reference(&task), started);
    }

    #[test]
    fn uncompleted_task_has_zero_duration() {
        let task = base_task();
        assert_eq!(work_duration_minutes(&task), 0);
    }

    #[test]
    fn estimates_ignore_missing_values() {
        let mut task = base_task();
        task.steps = vec![step("a", Some(30)), step("b", None), step("c", Some(60))];
        assert_eq!(estimated_total_minutes(&task), 90);
    }

    #[test]
    fn variance_absent_without_estimate_or_completion() {
        let mut task = base_task();
        task.steps = vec![step("a", None)];
        task.actual_completion_date = Some(task.created_at + Duration::minutes(10));
        assert_eq!(time_difference_minutes(&task), None);

        let mut task = base_task();
        task.steps = vec![step("a", Some(30))];
        assert_eq!(time_difference_minutes(&task), None);
    }

    #[test]
    fn ninety_five_actual_against_ninety_estimated_is_accurate() {
        let mut task = base_task();
        task.steps = vec![step("design", Some(30)), step("code", Some(60))];
        let started = task.created_at + Duration::hours(1);
        task.actual_start_date = Some(started);
        task.actual_completion_date = Some(started + Duration::minutes(95));

        let difference = time_difference_minutes(&task).expect("variance");
        assert_eq!(difference, 5);
        assert_eq!(classify(difference, 90), EstimateAccuracy::Accurate);
    }

    #[test]
    fn classification_boundary_is_twenty_percent() {
        // Exactly 20% either way still counts as accurate.
        assert_eq!(classify(20, 100), EstimateAccuracy::Accurate);
        assert_eq!(classify(-20, 100), EstimateAccuracy::Accurate);
        assert_eq!(classify(21, 100), EstimateAccuracy::Underestimated);
        assert_eq!(classify(-21, 100), EstimateAccuracy::Overestimated);
    }

    #[test]
    fn early_finish_is_negative_variance() {
        let mut task = base_task();
        task.steps = vec![step("a", Some(120))];
        task.actual_completion_date = Some(task.created_at + Duration::minutes(60));
        assert_eq!(time_difference_minutes(&task), Some(-60));
        assert_eq!(classify(-60, 120), EstimateAccuracy::Overestimated);
    }
}
