//! Markdown progress report
//!
//! Renders a task list plus its analysis into one regenerated
//! document. An optional date range narrows the input by creation
//! date with inclusive day bounds before any aggregation happens.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use crate::analysis::{TaskAnalysis, TaskVariance};
use crate::error::Result;
use crate::store;
use crate::task::{Task, TaskStatus};
use crate::timing::EstimateAccuracy;

/// Inclusive day-bounded reporting window, evaluated against `createdAt`
#[derive(Debug, Clone, Copy)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    /// Widen the day bounds into instants: start of the first day to
    /// the last millisecond of the final day.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .start
            .and_hms_milli_opt(0, 0, 0, 0)
            .expect("valid midnight")
            .and_utc();
        let end = self
            .end
            .and_hms_milli_opt(23, 59, 59, 999)
            .expect("valid end of day")
            .and_utc();
        (start, end)
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let (start, end) = self.bounds();
        at >= start && at <= end
    }
}

/// Keep only tasks created inside the window
pub fn filter_by_created(tasks: &[Task], range: &ReportRange) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| range.contains(task.created_at))
        .cloned()
        .collect()
}

/// Render the full Markdown document
pub fn render(
    tasks: &[Task],
    analysis: &TaskAnalysis,
    range: Option<&ReportRange>,
    now: DateTime<Utc>,
) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# Task Progress Report".to_string());
    lines.push(String::new());
    lines.push(format!("_Generated: {} UTC_", now.format("%Y-%m-%d %H:%M")));

    if let Some(range) = range {
        lines.push(String::new());
        lines.push(format!(
            "> Date range: {} to {} (by creation date)",
            range.start, range.end
        ));
    }

    push_overview(&mut lines, analysis);
    push_tags(&mut lines, analysis);
    push_details(&mut lines, tasks);
    push_up_next(&mut lines, tasks);
    push_start_variance(&mut lines, tasks);
    push_recommendations(&mut lines, tasks, analysis);
    push_estimate_variance(&mut lines, analysis);

    lines.push(String::new());
    lines.join("\n")
}

/// Write the document, creating parent directories as needed
pub fn write_report(path: &Path, markdown: &str) -> Result<()> {
    store::write_atomic(path, markdown.as_bytes())
}

fn push_overview(lines: &mut Vec<String>, analysis: &TaskAnalysis) {
    lines.push(String::new());
    lines.push("## Overview".to_string());
    lines.push(String::new());
    lines.push("| Metric | Value |".to_string());
    lines.push("| --- | --- |".to_string());
    lines.push(format!("| Total tasks | {} |", analysis.total));
    lines.push(format!("| Pending | {} |", analysis.status_counts.pending));
    lines.push(format!(
        "| In progress | {} |",
        analysis.status_counts.in_progress
    ));
    lines.push(format!(
        "| Completed | {} |",
        analysis.status_counts.completed
    ));
    lines.push(format!(
        "| Cancelled | {} |",
        analysis.status_counts.cancelled
    ));
    lines.push(format!("| Overdue | {} |", analysis.overdue));
    let completion = match analysis.average_completion_hours {
        Some(hours) => format!("{hours:.1} h"),
        None => "n/a".to_string(),
    };
    lines.push(format!("| Average completion time | {completion} |"));
    let variance = match analysis.average_time_difference_minutes {
        Some(minutes) => format!("{minutes:+.1} min"),
        None => "n/a".to_string(),
    };
    lines.push(format!("| Average estimate variance | {variance} |"));
}

fn push_tags(lines: &mut Vec<String>, analysis: &TaskAnalysis) {
    lines.push(String::new());
    lines.push("## Tags".to_string());
    lines.push(String::new());
    if analysis.tag_distribution.is_empty() {
        lines.push("No tags recorded.".to_string());
        return;
    }

    // Stable sort keeps first-seen order among equal counts.
    let mut entries = analysis.tag_distribution.clone();
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    lines.push("| Tag | Count |".to_string());
    lines.push("| --- | --- |".to_string());
    for entry in entries {
        lines.push(format!("| {} | {} |", entry.tag, entry.count));
    }
}

const DETAIL_ORDER: [(TaskStatus, &str); 4] = [
    (TaskStatus::Completed, "Completed"),
    (TaskStatus::InProgress, "In progress"),
    (TaskStatus::Pending, "Pending"),
    (TaskStatus::Cancelled, "Cancelled"),
];

fn push_details(lines: &mut Vec<String>, tasks: &[Task]) {
    lines.push(String::new());
    lines.push("## Task details".to_string());

    for (status, heading) in DETAIL_ORDER {
        let group: Vec<&Task> = tasks.iter().filter(|task| task.status == status).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("### {heading}"));
        for task in group {
            push_task_detail(lines, task);
        }
    }
}

fn push_task_detail(lines: &mut Vec<String>, task: &Task) {
    lines.push(String::new());
    lines.push(format!("#### {}", task.title));
    lines.push(String::new());
    let done = task.steps.iter().filter(|step| step.completed).count();
    lines.push(format!(
        "- Progress: {:.0}% ({done}/{} steps)",
        task.completion_percent(),
        task.steps.len()
    ));
    lines.push(format!("- Created: {}", format_date(task.created_at)));
    if let Some(due) = task.due_date {
        lines.push(format!("- Due: {}", format_date(due)));
    }
    if let Some(planned) = task.planned_start_date {
        lines.push(format!("- Planned start: {}", format_date(planned)));
    }
    if let Some(started) = task.actual_start_date {
        lines.push(format!("- Started: {}", format_date(started)));
    }
    if let Some(completed) = task.actual_completion_date {
        lines.push(format!("- Completed: {}", format_date(completed)));
    }
    if !task.tags.is_empty() {
        lines.push(format!("- Tags: {}", task.tags.join(", ")));
    }

    let completed: Vec<String> = task
        .steps
        .iter()
        .filter(|step| step.completed)
        .map(|step| format!("- [x] {}", step_label(step)))
        .collect();
    let remaining: Vec<String> = task
        .steps
        .iter()
        .filter(|step| !step.completed)
        .map(|step| format!("- [ ] {}", step_label(step)))
        .collect();

    if !completed.is_empty() {
        lines.push(String::new());
        lines.push("Completed steps:".to_string());
        lines.extend(completed);
    }
    if !remaining.is_empty() {
        lines.push(String::new());
        lines.push("Remaining steps:".to_string());
        lines.extend(remaining);
    }
}

fn step_label(step: &crate::task::Step) -> String {
    match step.estimated_time {
        Some(minutes) => format!("{} ({minutes} min)", step.description),
        None => step.description.clone(),
    }
}

// The three quickest estimated wins across active tasks.
fn push_up_next(lines: &mut Vec<String>, tasks: &[Task]) {
    lines.push(String::new());
    lines.push("## Up next".to_string());
    lines.push(String::new());

    let mut candidates: Vec<(u32, &str, &str)> = Vec::new();
    for task in tasks {
        if !matches!(task.status, TaskStatus::Pending | TaskStatus::InProgress) {
            continue;
        }
        for step in &task.steps {
            if step.completed {
                continue;
            }
            if let Some(minutes) = step.estimated_time {
                if minutes > 0 {
                    candidates.push((minutes, step.description.as_str(), task.title.as_str()));
                }
            }
        }
    }
    candidates.sort_by_key(|(minutes, _, _)| *minutes);

    if candidates.is_empty() {
        lines.push("No estimated steps remaining.".to_string());
        return;
    }
    for (minutes, description, title) in candidates.into_iter().take(3) {
        lines.push(format!("- {minutes} min: {description} ({title})"));
    }
}

fn push_start_variance(lines: &mut Vec<String>, tasks: &[Task]) {
    lines.push(String::new());
    lines.push("## Start date variance".to_string());
    lines.push(String::new());

    let rows: Vec<(&str, NaiveDate, NaiveDate, i64)> = tasks
        .iter()
        .filter_map(|task| {
            let planned = task.planned_start_date?.date_naive();
            let actual = task.actual_start_date?.date_naive();
            let offset = (actual - planned).num_days();
            Some((task.title.as_str(), planned, actual, offset))
        })
        .collect();

    if rows.is_empty() {
        lines.push("No tasks carry both a planned and an actual start date.".to_string());
        return;
    }

    lines.push("| Task | Planned | Actual | Offset (days) |".to_string());
    lines.push("| --- | --- | --- | --- |".to_string());
    let mut total = 0i64;
    for (title, planned, actual, offset) in &rows {
        total += offset;
        lines.push(format!("| {title} | {planned} | {actual} | {offset:+} |"));
    }
    let average = total as f64 / rows.len() as f64;
    lines.push(String::new());
    lines.push(format!("Average start offset: {average:+.1} days"));
}

fn push_recommendations(lines: &mut Vec<String>, tasks: &[Task], analysis: &TaskAnalysis) {
    lines.push(String::new());
    lines.push("## Recommendations".to_string());
    lines.push(String::new());

    if analysis.overdue > 0 {
        lines.push(format!(
            "- {} task(s) are overdue. Revisit due dates or reprioritize.",
            analysis.overdue
        ));
    }

    let total_steps: usize = tasks.iter().map(|task| task.steps.len()).sum();
    let done_steps: usize = tasks
        .iter()
        .map(|task| task.steps.iter().filter(|step| step.completed).count())
        .sum();
    let percent = if total_steps == 0 {
        0.0
    } else {
        done_steps as f64 / total_steps as f64 * 100.0
    };

    if percent < 25.0 {
        lines.push(format!(
            "- Step completion is at {percent:.0}%. Most work is still ahead; consider narrowing focus to one task."
        ));
    } else if percent < 50.0 {
        lines.push(format!(
            "- Step completion is at {percent:.0}%. Keep closing out started steps before opening new tasks."
        ));
    } else if percent < 75.0 {
        lines.push(format!(
            "- Step completion is at {percent:.0}%. Over half done; schedule the remaining steps explicitly."
        ));
    } else {
        lines.push(format!(
            "- Step completion is at {percent:.0}%. The backlog is nearly cleared; complete finished tasks to record completion dates."
        ));
    }
}

fn push_estimate_variance(lines: &mut Vec<String>, analysis: &TaskAnalysis) {
    if analysis.variances.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("## Estimate variance".to_string());
    lines.push(String::new());
    lines.push("| Task | Estimated (min) | Actual (min) | Difference (min) | Assessment |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());

    let mut entries = analysis.variances.clone();
    entries.sort_by(|a, b| b.difference_minutes.cmp(&a.difference_minutes));
    for entry in &entries {
        lines.push(format!(
            "| {} | {} | {} | {:+} | {} |",
            entry.title,
            entry.estimated_minutes,
            entry.actual_minutes,
            entry.difference_minutes,
            entry.accuracy.as_str()
        ));
    }

    push_accuracy_summary(lines, &entries);
    push_call_outs(lines, &entries);
    push_trend(lines, &entries);
}

fn push_accuracy_summary(lines: &mut Vec<String>, entries: &[TaskVariance]) {
    let total = entries.len();
    let count =
        |accuracy: EstimateAccuracy| entries.iter().filter(|e| e.accuracy == accuracy).count();
    let percent = |n: usize| n as f64 / total as f64 * 100.0;

    let accurate = count(EstimateAccuracy::Accurate);
    let under = count(EstimateAccuracy::Underestimated);
    let over = count(EstimateAccuracy::Overestimated);

    lines.push(String::new());
    lines.push("Estimation accuracy:".to_string());
    lines.push(format!(
        "- accurate: {:.0}% ({accurate} of {total})",
        percent(accurate)
    ));
    lines.push(format!(
        "- underestimated: {:.0}% ({under} of {total})",
        percent(under)
    ));
    lines.push(format!(
        "- overestimated: {:.0}% ({over} of {total})",
        percent(over)
    ));
}

fn push_call_outs(lines: &mut Vec<String>, entries: &[TaskVariance]) {
    let most_under = entries
        .iter()
        .filter(|entry| entry.difference_minutes > 0)
        .max_by_key(|entry| entry.difference_minutes);
    let most_over = entries
        .iter()
        .filter(|entry| entry.difference_minutes < 0)
        .min_by_key(|entry| entry.difference_minutes);

    if most_under.is_none() && most_over.is_none() {
        return;
    }
    lines.push(String::new());
    if let Some(entry) = most_under {
        lines.push(format!(
            "Most underestimated: {} (overran by {} min)",
            entry.title, entry.difference_minutes
        ));
    }
    if let Some(entry) = most_over {
        lines.push(format!(
            "Most overestimated: {} (finished {} min early)",
            entry.title,
            entry.difference_minutes.abs()
        ));
    }
}

// First half vs second half, chronological by completion date.
fn push_trend(lines: &mut Vec<String>, entries: &[TaskVariance]) {
    if entries.len() < 3 {
        return;
    }

    let mut ordered: Vec<&TaskVariance> = entries.iter().collect();
    ordered.sort_by_key(|entry| entry.completed_at);
    let midpoint = ordered.len() / 2;
    let (earlier, later) = ordered.split_at(midpoint);

    let ratio = |slice: &[&TaskVariance]| {
        slice
            .iter()
            .map(|entry| entry.actual_minutes as f64 / entry.estimated_minutes as f64)
            .sum::<f64>()
            / slice.len() as f64
    };
    let earlier_ratio = ratio(earlier);
    let later_ratio = ratio(later);

    let verdict = if later_ratio < earlier_ratio {
        "estimates are getting tighter"
    } else if later_ratio > earlier_ratio {
        "overruns are growing"
    } else {
        "estimation accuracy is steady"
    };

    lines.push(String::new());
    lines.push("Trend:".to_string());
    lines.push(format!(
        "- Mean actual/estimated ratio moved from {earlier_ratio:.2} to {later_ratio:.2}; {verdict}."
    ));
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
