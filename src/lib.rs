//! wt - Personal work tracker
//!
//! Stores discrete work items with ordered sub-steps, advances them
//! through a constrained lifecycle, derives time-based performance
//! metrics, and renders Markdown progress reports.
//!
//! # Core Concepts
//!
//! - **Tasks**: work items with ordered steps, tags, and schedule fields
//! - **Lifecycle**: pending, in progress, completed, cancelled, with
//!   explicit transition rules
//! - **Time analytics**: estimated vs actual duration and variance
//!   classification
//! - **Reports**: regenerated Markdown documents with aggregate tables
//!   and trend analysis
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `clock`: injectable time and id sources
//! - `config`: configuration loading from `wt.toml`
//! - `error`: error types and result aliases
//! - `task`: task/step data model and status state machine
//! - `store`: whole-document JSON persistence
//! - `manager`: lifecycle operations over the store
//! - `timing`: pure per-task time analytics
//! - `analysis`: aggregate statistics over a task list
//! - `report`: Markdown report rendering
//! - `output`: shared CLI output envelopes

pub mod analysis;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod output;
pub mod report;
pub mod store;
pub mod task;
pub mod timing;

pub use error::{Error, Result};
