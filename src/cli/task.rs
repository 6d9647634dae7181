//! wt task command implementations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::analysis;
use crate::cli::CommandContext;
use crate::error::{Error, Result};
use crate::manager::{StepOutcome, TaskManager};
use crate::output::{emit_success, HumanOutput};
use crate::task::{NewStep, NewTask, StepUpdate, Task, TaskFilter, TaskStatus, TaskUpdate};

pub struct NewOptions {
    pub title: String,
    pub description: String,
    pub steps: Vec<String>,
    pub tags: Vec<String>,
    pub due: Option<String>,
    pub planned_start: Option<String>,
    pub priority: Option<u8>,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<u8>,
    pub due: Option<String>,
    pub planned_start: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

pub struct StepUpdateOptions {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<u32>,
    pub estimate: Option<u32>,
}

pub struct SearchOptions {
    pub status: Option<String>,
    pub tags: Vec<String>,
    pub priority: Option<u8>,
    pub due_from: Option<String>,
    pub due_to: Option<String>,
    pub planned_from: Option<String>,
    pub planned_to: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub text: Option<String>,
}

pub fn run_new(ctx: &CommandContext, options: NewOptions) -> Result<()> {
    let manager = ctx.manager();
    let task = manager.create_task(NewTask {
        title: options.title,
        description: options.description,
        steps: options
            .steps
            .iter()
            .map(|spec| parse_step_spec(spec))
            .collect(),
        tags: options.tags,
        due_date: parse_optional_timestamp(options.due.as_deref())?,
        planned_start_date: parse_optional_timestamp(options.planned_start.as_deref())?,
        priority: options.priority,
    })?;

    let mut human = HumanOutput::new(format!("Created task {}", task.id));
    human.push_summary("title", &task.title);
    human.push_summary("status", task.status.as_str());
    human.push_summary("priority", task.priority.to_string());
    if !task.steps.is_empty() {
        human.push_summary("steps", task.steps.len().to_string());
    }
    emit_success(ctx.output, "new", &task, Some(&human))
}

pub fn run_list(ctx: &CommandContext) -> Result<()> {
    let tasks = ctx.manager().get_all_tasks()?;

    let mut human = HumanOutput::new(format!("{} task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(task_line(task));
    }
    emit_success(ctx.output, "list", &tasks, Some(&human))
}

pub fn run_show(ctx: &CommandContext, id: &str) -> Result<()> {
    let task = require_task(&ctx.manager(), id)?;

    let mut human = HumanOutput::new(format!("{} ({})", task.title, task.id));
    human.push_summary("status", task.status.as_str());
    human.push_summary("priority", task.priority.to_string());
    human.push_summary(
        "progress",
        format!("{:.0}%", task.completion_percent()),
    );
    if !task.tags.is_empty() {
        human.push_summary("tags", task.tags.join(", "));
    }
    for step in &task.steps {
        let mark = if step.completed { "x" } else { " " };
        let estimate = step
            .estimated_time
            .map(|minutes| format!(" ({minutes} min)"))
            .unwrap_or_default();
        human.push_detail(format!(
            "[{mark}] {}. {}{estimate} <{}>",
            step.order, step.description, step.id
        ));
    }
    emit_success(ctx.output, "show", &task, Some(&human))
}

pub fn run_update(ctx: &CommandContext, options: UpdateOptions) -> Result<()> {
    let status = options
        .status
        .as_deref()
        .map(TaskStatus::parse)
        .transpose()?;
    let tags = if options.clear_tags {
        Some(Vec::new())
    } else if options.tags.is_empty() {
        None
    } else {
        Some(options.tags)
    };

    let manager = ctx.manager();
    let task = manager
        .update_task(
            &options.id,
            TaskUpdate {
                title: options.title,
                description: options.description,
                status,
                priority: options.priority,
                due_date: parse_optional_timestamp(options.due.as_deref())?,
                planned_start_date: parse_optional_timestamp(options.planned_start.as_deref())?,
                tags,
            },
        )?
        .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;

    let mut human = HumanOutput::new(format!("Updated task {}", task.id));
    human.push_summary("status", task.status.as_str());
    emit_success(ctx.output, "update", &task, Some(&human))
}

pub fn run_start(ctx: &CommandContext, id: &str) -> Result<()> {
    let task = ctx
        .manager()
        .start_task(id)?
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

    let mut human = HumanOutput::new(format!("Started task {}", task.id));
    if let Some(started) = task.actual_start_date {
        human.push_summary("started", started.to_rfc3339());
    }
    emit_success(ctx.output, "start", &task, Some(&human))
}

pub fn run_complete(ctx: &CommandContext, id: &str, at: Option<&str>) -> Result<()> {
    let completion_date = parse_optional_timestamp(at)?;
    let task = ctx
        .manager()
        .complete_task(id, completion_date)?
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

    let mut human = HumanOutput::new(format!("Completed task {}", task.id));
    if let Some(done) = task.actual_completion_date {
        human.push_summary("completed", done.to_rfc3339());
    }
    emit_success(ctx.output, "complete", &task, Some(&human))
}

pub fn run_delete(ctx: &CommandContext, id: &str) -> Result<()> {
    let deleted = ctx.manager().delete_task(id)?;
    if !deleted {
        return Err(Error::TaskNotFound(id.to_string()));
    }

    #[derive(Serialize)]
    struct Deleted<'a> {
        id: &'a str,
        deleted: bool,
    }

    let human = HumanOutput::new(format!("Deleted task {id}"));
    emit_success(ctx.output, "delete", &Deleted { id, deleted: true }, Some(&human))
}

pub fn run_step_add(
    ctx: &CommandContext,
    task_id: &str,
    description: String,
    order: Option<u32>,
    estimate: Option<u32>,
) -> Result<()> {
    let task = ctx
        .manager()
        .add_step(
            task_id,
            NewStep {
                description,
                order,
                estimated_time: estimate,
                completed: None,
            },
        )?
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

    let mut human = HumanOutput::new(format!("Added step to {}", task.id));
    human.push_summary("steps", task.steps.len().to_string());
    emit_success(ctx.output, "step add", &task, Some(&human))
}

pub fn run_step_update(
    ctx: &CommandContext,
    task_id: &str,
    step_id: &str,
    options: StepUpdateOptions,
) -> Result<()> {
    let outcome = ctx
        .manager()
        .update_step(
            task_id,
            step_id,
            StepUpdate {
                description: options.description,
                completed: options.completed,
                order: options.order,
                estimated_time: options.estimate,
            },
        )?
        .ok_or_else(|| Error::StepNotFound {
            task: task_id.to_string(),
            step: step_id.to_string(),
        })?;

    let mut human = HumanOutput::new(format!("Updated step {step_id}"));
    push_advisory(&mut human, &outcome);
    emit_success(ctx.output, "step update", &outcome.task, Some(&human))
}

pub fn run_step_delete(ctx: &CommandContext, task_id: &str, step_id: &str) -> Result<()> {
    let task = ctx
        .manager()
        .delete_step(task_id, step_id)?
        .ok_or_else(|| Error::StepNotFound {
            task: task_id.to_string(),
            step: step_id.to_string(),
        })?;

    let mut human = HumanOutput::new(format!("Deleted step {step_id}"));
    human.push_summary("remaining steps", task.steps.len().to_string());
    emit_success(ctx.output, "step delete", &task, Some(&human))
}

pub fn run_step_set_all(ctx: &CommandContext, task_id: &str, completed: bool) -> Result<()> {
    let outcome = ctx
        .manager()
        .set_all_steps(task_id, completed)?
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;

    let verb = if completed { "done" } else { "reset" };
    let mut human = HumanOutput::new(format!(
        "Marked all steps of {} as {verb}",
        outcome.task.id
    ));
    human.push_summary("status", outcome.task.status.as_str());
    push_advisory(&mut human, &outcome);
    emit_success(ctx.output, "step set-all", &outcome.task, Some(&human))
}

pub fn run_search(ctx: &CommandContext, options: SearchOptions) -> Result<()> {
    let filter = TaskFilter {
        status: options
            .status
            .as_deref()
            .map(TaskStatus::parse)
            .transpose()?,
        tags: options.tags,
        priority: options.priority,
        due_from: parse_optional_timestamp(options.due_from.as_deref())?,
        due_to: parse_optional_timestamp(options.due_to.as_deref())?,
        planned_from: parse_optional_timestamp(options.planned_from.as_deref())?,
        planned_to: parse_optional_timestamp(options.planned_to.as_deref())?,
        created_from: parse_optional_timestamp(options.created_from.as_deref())?,
        created_to: parse_optional_timestamp(options.created_to.as_deref())?,
        text: options.text,
    };

    let tasks = ctx.manager().search_tasks(&filter)?;
    let mut human = HumanOutput::new(format!("{} matching task(s)", tasks.len()));
    for task in &tasks {
        human.push_detail(task_line(task));
    }
    emit_success(ctx.output, "search", &tasks, Some(&human))
}

pub fn run_stats(ctx: &CommandContext) -> Result<()> {
    let manager = ctx.manager();
    let tasks = manager.get_all_tasks()?;
    let stats = analysis::analyze(&tasks, manager.now());

    let mut human = HumanOutput::new("Task statistics");
    human.push_summary("total", stats.total.to_string());
    human.push_summary("pending", stats.status_counts.pending.to_string());
    human.push_summary("in progress", stats.status_counts.in_progress.to_string());
    human.push_summary("completed", stats.status_counts.completed.to_string());
    human.push_summary("cancelled", stats.status_counts.cancelled.to_string());
    human.push_summary("overdue", stats.overdue.to_string());
    if let Some(hours) = stats.average_completion_hours {
        human.push_summary("avg completion", format!("{hours:.1} h"));
    }
    if let Some(minutes) = stats.average_time_difference_minutes {
        human.push_summary("avg estimate variance", format!("{minutes:+.1} min"));
    }
    emit_success(ctx.output, "stats", &stats, Some(&human))
}

fn push_advisory(human: &mut HumanOutput, outcome: &StepOutcome) {
    if outcome.all_steps_complete && outcome.task.status != TaskStatus::Completed {
        human.push_warning("all steps are complete, but the task is not");
        human.push_next_step(format!("wt complete {}", outcome.task.id));
    }
}

fn require_task(manager: &TaskManager, id: &str) -> Result<Task> {
    manager
        .get_task(id)?
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

fn task_line(task: &Task) -> String {
    format!(
        "{} [{}] p{} {} ({:.0}%)",
        task.id,
        task.status.as_str(),
        task.priority,
        task.title,
        task.completion_percent()
    )
}

/// "description" or "description:estimated-minutes"
fn parse_step_spec(spec: &str) -> NewStep {
    if let Some((description, minutes)) = spec.rsplit_once(':') {
        if let Ok(estimate) = minutes.trim().parse::<u32>() {
            return NewStep {
                description: description.trim().to_string(),
                estimated_time: Some(estimate),
                ..NewStep::default()
            };
        }
    }
    NewStep {
        description: spec.trim().to_string(),
        ..NewStep::default()
    }
}

fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

/// Accepts RFC 3339 or a bare date taken as midnight UTC
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(date) = trimmed.parse::<NaiveDate>() {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(Error::InvalidArgument(format!(
        "cannot parse '{trimmed}' as RFC 3339 or YYYY-MM-DD"
    )))
}
