//! wt report command implementation.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis;
use crate::cli::CommandContext;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::report::{self, ReportRange};

pub struct ReportOptions {
    pub from: Option<String>,
    pub to: Option<String>,
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ReportSummary {
    path: PathBuf,
    tasks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<NaiveDate>,
}

pub fn run_report(ctx: &CommandContext, options: ReportOptions) -> Result<()> {
    let range = parse_range(options.from.as_deref(), options.to.as_deref())?;

    let manager = ctx.manager();
    let all = manager.get_all_tasks()?;
    let tasks = match &range {
        Some(range) => report::filter_by_created(&all, range),
        None => all,
    };

    let now = manager.now();
    let stats = analysis::analyze(&tasks, now);
    let markdown = report::render(&tasks, &stats, range.as_ref(), now);

    let path = options
        .output
        .map(|path| {
            if path.is_absolute() {
                path
            } else {
                ctx.root.join(path)
            }
        })
        .unwrap_or_else(|| ctx.config.report_file(&ctx.root));
    report::write_report(&path, &markdown)?;

    let summary = ReportSummary {
        path: path.clone(),
        tasks: tasks.len(),
        from: range.map(|range| range.start),
        to: range.map(|range| range.end),
    };

    let mut human = HumanOutput::new("Report generated");
    human.push_summary("path", path.display().to_string());
    human.push_summary("tasks", tasks.len().to_string());
    if let Some(range) = &range {
        human.push_summary("window", format!("{} to {}", range.start, range.end));
    }
    emit_success(ctx.output, "report", &summary, Some(&human))
}

// Both bounds are required together so the window is always explicit.
fn parse_range(from: Option<&str>, to: Option<&str>) -> Result<Option<ReportRange>> {
    match (from, to) {
        (None, None) => Ok(None),
        (Some(from), Some(to)) => {
            let start = parse_date(from)?;
            let end = parse_date(to)?;
            if end < start {
                return Err(Error::InvalidArgument(format!(
                    "report window ends ({end}) before it starts ({start})"
                )));
            }
            Ok(Some(ReportRange { start, end }))
        }
        _ => Err(Error::InvalidArgument(
            "--from and --to must be given together".to_string(),
        )),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value.trim().parse::<NaiveDate>().map_err(|_| {
        Error::InvalidArgument(format!("cannot parse '{value}' as YYYY-MM-DD"))
    })
}
