//! Command-line interface for wt
//!
//! This module defines the CLI structure using clap derive macros.
//! Every operation is a named subcommand with typed parameters; the
//! handlers live in `task.rs` and `report.rs`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::manager::TaskManager;
use crate::output::OutputOptions;
use crate::store::TaskStore;

mod report;
mod task;

/// wt - personal work tracker
///
/// Tasks with ordered steps, lifecycle rules, time analytics, and
/// Markdown progress reports.
#[derive(Parser, Debug)]
#[command(name = "wt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data root holding wt.toml and the task document (defaults to
    /// the current directory)
    #[arg(long, global = true, env = "WT_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    New {
        /// Task title
        title: String,

        /// Task description
        #[arg(short, long)]
        description: String,

        /// Step as "description" or "description:estimated-minutes";
        /// repeatable, ordered by position
        #[arg(long = "step")]
        steps: Vec<String>,

        /// Tag; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Due date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Planned start date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        planned_start: Option<String>,

        /// Priority, 1 = highest .. 5 = lowest
        #[arg(long)]
        priority: Option<u8>,
    },

    /// List all tasks
    List,

    /// Show one task
    Show {
        /// Task id
        id: String,
    },

    /// Update task fields (status cannot be set to completed here)
    Update {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// New status: pending, in_progress, cancelled
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        priority: Option<u8>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        planned_start: Option<String>,

        /// Replace the tag list; repeatable
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove every tag
        #[arg(long)]
        clear_tags: bool,
    },

    /// Start a pending task
    Start {
        /// Task id
        id: String,
    },

    /// Complete a task, stamping the completion date
    Complete {
        /// Task id
        id: String,

        /// Completion timestamp (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Delete a task permanently
    Delete {
        /// Task id
        id: String,
    },

    /// Step management
    #[command(subcommand)]
    Step(StepCommands),

    /// Search tasks; all filters are combined with AND
    Search {
        /// Status filter
        #[arg(long)]
        status: Option<String>,

        /// Tag the task must carry; repeatable, all must match
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Exact priority
        #[arg(long)]
        priority: Option<u8>,

        #[arg(long)]
        due_from: Option<String>,

        #[arg(long)]
        due_to: Option<String>,

        #[arg(long)]
        planned_from: Option<String>,

        #[arg(long)]
        planned_to: Option<String>,

        #[arg(long)]
        created_from: Option<String>,

        #[arg(long)]
        created_to: Option<String>,

        /// Case-insensitive substring over titles, descriptions, and steps
        #[arg(long)]
        text: Option<String>,
    },

    /// Aggregate statistics over all tasks
    Stats,

    /// Generate the Markdown progress report
    Report {
        /// First day of the window (YYYY-MM-DD), by creation date
        #[arg(long)]
        from: Option<String>,

        /// Last day of the window (YYYY-MM-DD), inclusive
        #[arg(long)]
        to: Option<String>,

        /// Report path; defaults to the configured report_path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Step subcommands
#[derive(Subcommand, Debug)]
pub enum StepCommands {
    /// Add a step to a task
    Add {
        /// Task id
        task: String,

        /// Step description
        description: String,

        /// Position in the sequence; defaults to the end
        #[arg(long)]
        order: Option<u32>,

        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
    },

    /// Update step fields
    Update {
        /// Task id
        task: String,

        /// Step id
        step: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Mark the step complete or incomplete
        #[arg(long, action = ArgAction::Set)]
        completed: Option<bool>,

        #[arg(long)]
        order: Option<u32>,

        /// Estimated minutes
        #[arg(long)]
        estimate: Option<u32>,
    },

    /// Delete a step and renumber the rest
    Delete {
        /// Task id
        task: String,

        /// Step id
        step: String,
    },

    /// Set every step's completed flag at once
    SetAll {
        /// Task id
        task: String,

        /// true marks all steps done, false resets them
        #[arg(long, action = ArgAction::Set)]
        completed: bool,
    },
}

/// Shared handler context: resolved data root, config, output options
pub(crate) struct CommandContext {
    pub root: PathBuf,
    pub config: Config,
    pub output: OutputOptions,
}

impl CommandContext {
    fn resolve(dir: Option<PathBuf>, json: bool, quiet: bool) -> Result<Self> {
        let root = match dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let config = Config::load(&root)?;
        Ok(Self {
            root,
            config,
            output: OutputOptions { json, quiet },
        })
    }

    pub fn manager(&self) -> TaskManager {
        TaskManager::new(TaskStore::new(self.config.tasks_file(&self.root)))
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let ctx = CommandContext::resolve(self.dir, self.json, self.quiet)?;

        match self.command {
            Commands::New {
                title,
                description,
                steps,
                tags,
                due,
                planned_start,
                priority,
            } => task::run_new(
                &ctx,
                task::NewOptions {
                    title,
                    description,
                    steps,
                    tags,
                    due,
                    planned_start,
                    priority,
                },
            ),
            Commands::List => task::run_list(&ctx),
            Commands::Show { id } => task::run_show(&ctx, &id),
            Commands::Update {
                id,
                title,
                description,
                status,
                priority,
                due,
                planned_start,
                tags,
                clear_tags,
            } => task::run_update(
                &ctx,
                task::UpdateOptions {
                    id,
                    title,
                    description,
                    status,
                    priority,
                    due,
                    planned_start,
                    tags,
                    clear_tags,
                },
            ),
            Commands::Start { id } => task::run_start(&ctx, &id),
            Commands::Complete { id, at } => task::run_complete(&ctx, &id, at.as_deref()),
            Commands::Delete { id } => task::run_delete(&ctx, &id),
            Commands::Step(step) => match step {
                StepCommands::Add {
                    task,
                    description,
                    order,
                    estimate,
                } => task::run_step_add(&ctx, &task, description, order, estimate),
                StepCommands::Update {
                    task,
                    step,
                    description,
                    completed,
                    order,
                    estimate,
                } => task::run_step_update(
                    &ctx,
                    &task,
                    &step,
                    task::StepUpdateOptions {
                        description,
                        completed,
                        order,
                        estimate,
                    },
                ),
                StepCommands::Delete { task, step } => task::run_step_delete(&ctx, &task, &step),
                StepCommands::SetAll { task, completed } => {
                    task::run_step_set_all(&ctx, &task, completed)
                }
            },
            Commands::Search {
                status,
                tags,
                priority,
                due_from,
                due_to,
                planned_from,
                planned_to,
                created_from,
                created_to,
                text,
            } => task::run_search(
                &ctx,
                task::SearchOptions {
                    status,
                    tags,
                    priority,
                    due_from,
                    due_to,
                    planned_from,
                    planned_to,
                    created_from,
                    created_to,
                    text,
                },
            ),
            Commands::Stats => task::run_stats(&ctx),
            Commands::Report { from, to, output } => report::run_report(
                &ctx,
                report::ReportOptions {
                    from,
                    to,
                    output,
                },
            ),
        }
    }
}
