//! Task lifecycle manager
//!
//! Every mutating operation is a full load of the document, an
//! in-memory change, and a full save. A single logical writer is
//! assumed; the store never sees a partial batch because the save only
//! runs after the merge succeeded.
//!
//! Unknown task or step ids are a non-exceptional signal: operations
//! return `Ok(None)` (or `Ok(false)` for delete) and leave it to the
//! caller to word the message.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::clock::{Clock, IdGenerator, SystemClock, UuidIds};
use crate::error::{Error, Result};
use crate::store::TaskStore;
use crate::task::{
    NewStep, NewTask, Step, StepUpdate, Task, TaskFilter, TaskStatus, TaskUpdate, DEFAULT_PRIORITY,
    PRIORITY_MAX, PRIORITY_MIN,
};

/// Result of a step mutation, carrying the advisory completion signal.
///
/// `all_steps_complete` never changes the task status by itself;
/// completion always requires the dedicated complete operation.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub task: Task,
    pub all_steps_complete: bool,
}

pub struct TaskManager {
    store: TaskStore,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl TaskManager {
    pub fn new(store: TaskStore) -> Self {
        Self::with_parts(store, Box::new(SystemClock), Box::new(UuidIds))
    }

    /// Construct with explicit time and id sources for deterministic tests
    pub fn with_parts(
        store: TaskStore,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self { store, clock, ids }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        validate_text("title", &new.title)?;
        validate_text("description", &new.description)?;
        let priority = new.priority.unwrap_or(DEFAULT_PRIORITY);
        validate_priority(priority)?;

        let now = self.clock.now();
        let mut steps: Vec<Step> = new
            .steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| Step {
                id: self.ids.step_id(),
                description: step.description,
                completed: step.completed.unwrap_or(false),
                order: step.order.unwrap_or(index as u32 + 1),
                estimated_time: step.estimated_time,
            })
            .collect();
        steps.sort_by_key(|step| step.order);

        let task = Task {
            id: self.ids.task_id(),
            title: new.title,
            description: new.description,
            steps,
            tags: new.tags,
            created_at: now,
            updated_at: now,
            due_date: new.due_date,
            planned_start_date: new.planned_start_date,
            actual_start_date: None,
            actual_completion_date: None,
            status: TaskStatus::Pending,
            priority,
        };

        let mut tasks = self.store.load()?;
        tasks.push(task.clone());
        self.store.save(tasks)?;
        info!(task = %task.id, "created task");
        Ok(task)
    }

    pub fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.store.load()
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let tasks = self.store.load()?;
        Ok(tasks.into_iter().find(|task| task.id == id))
    }

    /// Merge the provided fields. Setting status to completed here is
    /// refused; completion goes through [`complete_task`] so the
    /// completion date is always stamped deliberately.
    ///
    /// [`complete_task`]: TaskManager::complete_task
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Option<Task>> {
        if update.status == Some(TaskStatus::Completed) {
            return Err(Error::Validation(
                "status cannot be set to 'completed' directly; use the complete operation"
                    .to_string(),
            ));
        }
        if let Some(title) = &update.title {
            validate_text("title", title)?;
        }
        if let Some(description) = &update.description {
            validate_text("description", description)?;
        }
        if let Some(priority) = update.priority {
            validate_priority(priority)?;
        }

        self.mutate(id, |task, now| {
            if let Some(title) = update.title.clone() {
                task.title = title;
            }
            if let Some(description) = update.description.clone() {
                task.description = description;
            }
            if let Some(status) = update.status {
                task.status = status;
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if let Some(due) = update.due_date {
                task.due_date = Some(due);
            }
            if let Some(planned) = update.planned_start_date {
                task.planned_start_date = Some(planned);
            }
            if let Some(tags) = update.tags.clone() {
                task.tags = tags;
            }
            task.updated_at = now;
            Ok(())
        })
    }

    /// Complete a task, stamping the completion date.
    ///
    /// Completing an already completed task refreshes the timestamp.
    pub fn complete_task(
        &self,
        id: &str,
        completion_date: Option<DateTime<Utc>>,
    ) -> Result<Option<Task>> {
        self.mutate(id, |task, now| {
            task.status = task.status.complete()?;
            task.actual_completion_date = Some(completion_date.unwrap_or(now));
            task.updated_at = now;
            Ok(())
        })
    }

    /// Move a pending task into progress, stamping the actual start.
    pub fn start_task(&self, id: &str) -> Result<Option<Task>> {
        self.mutate(id, |task, now| {
            task.status = task.status.start()?;
            task.actual_start_date = Some(now);
            task.updated_at = now;
            Ok(())
        })
    }

    pub fn delete_task(&self, id: &str) -> Result<bool> {
        let mut tasks = self.store.load()?;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Ok(false);
        }
        self.store.save(tasks)?;
        info!(task = %id, "deleted task");
        Ok(true)
    }

    /// Append a step. Without an explicit order the step goes to the
    /// end (`steps.len() + 1`); steps are re-sorted by order but not
    /// renumbered.
    pub fn add_step(&self, task_id: &str, step: NewStep) -> Result<Option<Task>> {
        validate_text("step description", &step.description)?;
        let id = self.ids.step_id();
        self.mutate(task_id, |task, now| {
            let order = step.order.unwrap_or(task.steps.len() as u32 + 1);
            task.steps.push(Step {
                id: id.clone(),
                description: step.description.clone(),
                completed: step.completed.unwrap_or(false),
                order,
                estimated_time: step.estimated_time,
            });
            task.steps.sort_by_key(|step| step.order);
            task.updated_at = now;
            Ok(())
        })
    }

    /// Merge fields into one step. Even when this makes every step
    /// complete, the task status is untouched; the outcome carries the
    /// advisory flag instead.
    pub fn update_step(
        &self,
        task_id: &str,
        step_id: &str,
        update: StepUpdate,
    ) -> Result<Option<StepOutcome>> {
        let updated = self.mutate(task_id, |task, now| {
            let Some(step) = task.steps.iter_mut().find(|step| step.id == step_id) else {
                return Err(Error::StepNotFound {
                    task: task_id.to_string(),
                    step: step_id.to_string(),
                });
            };
            if let Some(description) = update.description.clone() {
                step.description = description;
            }
            if let Some(completed) = update.completed {
                step.completed = completed;
            }
            if let Some(order) = update.order {
                step.order = order;
            }
            if let Some(estimate) = update.estimated_time {
                step.estimated_time = Some(estimate);
            }
            if update.order.is_some() {
                task.steps.sort_by_key(|step| step.order);
            }
            task.updated_at = now;
            Ok(())
        });

        // An unknown step id is the same non-exceptional absence as an
        // unknown task id.
        let task = match updated {
            Ok(Some(task)) => task,
            Ok(None) => return Ok(None),
            Err(Error::StepNotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let all_steps_complete = task.all_steps_complete();
        if all_steps_complete {
            info!(task = %task.id, "all steps complete; task still needs an explicit complete");
        }
        Ok(Some(StepOutcome {
            task,
            all_steps_complete,
        }))
    }

    /// Remove a step, then renumber the remainder to a contiguous
    /// 1..N sequence preserving relative order.
    pub fn delete_step(&self, task_id: &str, step_id: &str) -> Result<Option<Task>> {
        let updated = self.mutate(task_id, |task, now| {
            let before = task.steps.len();
            task.steps.retain(|step| step.id != step_id);
            if task.steps.len() == before {
                return Err(Error::StepNotFound {
                    task: task_id.to_string(),
                    step: step_id.to_string(),
                });
            }
            task.steps.sort_by_key(|step| step.order);
            for (index, step) in task.steps.iter_mut().enumerate() {
                step.order = index as u32 + 1;
            }
            task.updated_at = now;
            Ok(())
        });

        match updated {
            Ok(result) => Ok(result),
            Err(Error::StepNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Set every step's completed flag at once.
    ///
    /// Resetting the steps of a completed task reopens it to
    /// in-progress and clears the completion date. Checking every step
    /// never auto-completes; the advisory flag is the only signal.
    pub fn set_all_steps(&self, task_id: &str, completed: bool) -> Result<Option<StepOutcome>> {
        let updated = self.mutate(task_id, |task, now| {
            for step in &mut task.steps {
                step.completed = completed;
            }
            if !completed && task.status == TaskStatus::Completed {
                task.status = task.status.reopen();
                task.actual_completion_date = None;
            }
            task.updated_at = now;
            Ok(())
        })?;

        let Some(task) = updated else {
            return Ok(None);
        };
        let all_steps_complete = task.all_steps_complete();
        if all_steps_complete {
            info!(task = %task.id, "all steps complete; task still needs an explicit complete");
        }
        Ok(Some(StepOutcome {
            task,
            all_steps_complete,
        }))
    }

    /// Conjunctive search over the whole collection, in storage order.
    pub fn search_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let tasks = self.store.load()?;
        Ok(tasks.into_iter().filter(|task| filter.matches(task)).collect())
    }

    // Load, apply to the matching task, save. Returns the mutated task
    // or None when the id is unknown; the save is skipped on both
    // no-match and mutation failure.
    fn mutate<F>(&self, id: &str, apply: F) -> Result<Option<Task>>
    where
        F: Fn(&mut Task, DateTime<Utc>) -> Result<()>,
    {
        let mut tasks = self.store.load()?;
        let now = self.clock.now();
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        apply(task, now)?;
        let result = task.clone();
        self.store.save(tasks)?;
        Ok(Some(result))
    }
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::Validation(format!("{field} cannot be empty")))
    } else {
        Ok(())
    }
}

fn validate_priority(priority: u8) -> Result<()> {
    if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}, got {priority}"
        )))
    }
}
