//! Fixed report layout
//!
//! Sheet names and headers are part of the report's contract with whoever
//! reads it, so they are spelled out here once.

use serde::Serialize;

use super::{Cell, Report, Sheet};
use crate::pipeline::RunResults;
use crate::request::TimeRequestKind;
use crate::timing::Phase;
use crate::Job;

/// Jobs fetched by id
pub const JOBS_SHEET: &str = "JobsID";
/// Columns of [`JOBS_SHEET`]
pub const JOBS_HEADER: [&str; 8] = [
    "jobid",
    "well name",
    "contractor",
    "rignumber",
    "startDate",
    "firstDataDate",
    "lastDataDate",
    "jobnumber",
];

/// Attributes with data
pub const ATTRIBUTES_SHEET: &str = "Attributes";
/// Columns of [`ATTRIBUTES_SHEET`]
pub const ATTRIBUTES_HEADER: [&str; 2] = ["Job ID", "Attribute Data"];

/// Historical answers
pub const HISTORICAL_SHEET: &str = "TimeBased";
/// Current answers
pub const CURRENT_SHEET: &str = "CurrentTime";
/// Event answers
pub const EVENTS_SHEET: &str = "Events";

/// Slow calls
pub const ISSUES_SHEET: &str = "IssueJobs";
/// Columns of [`ISSUES_SHEET`]
pub const ISSUES_HEADER: [&str; 2] = ["JobID", "Time"];

fn data_sheet(kind: TimeRequestKind) -> (&'static str, [&'static str; 2]) {
    match kind {
        TimeRequestKind::Historical => (HISTORICAL_SHEET, ["Job ID", "Historical Data"]),
        TimeRequestKind::Current => (CURRENT_SHEET, ["Job ID", "Current Data"]),
        TimeRequestKind::Events => (EVENTS_SHEET, ["Job ID", "Event Data"]),
    }
}

/// Sheet name and single column header for a phase's timings
pub fn timing_sheet(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Token => ("Token Time", "Get Token Time Data"),
        Phase::AllJobs => ("All Jobs Time", "All Jobs Time Data"),
        Phase::JobById => ("Job_Id Time", "Job by Id Time"),
        Phase::Attributes => ("AttribPull Time", "All Attrib with data Time"),
        Phase::HistoricalPull => ("Hist_Pull Time", "Historic Pull Time- 'time/Data'"),
        Phase::CurrentPull => ("Curr_Pull Time", "Current Pull Time- 'time/current'"),
        Phase::EventPull => ("Event_Pull Time", "Event Pull Time- 'time/events'"),
        Phase::TotalProcess => ("Total Process Time", "Total Process Time"),
    }
}

fn job_row(job: &Job) -> Vec<Cell> {
    vec![
        Cell::Text(job.id.clone()),
        Cell::opt_text(job.name.as_deref()),
        Cell::opt_text(job.contractor.as_deref()),
        Cell::opt_text(job.rig_name.as_deref()),
        Cell::opt_text(job.start_date.as_deref()),
        Cell::opt_text(job.first_data_date.as_deref()),
        Cell::opt_text(job.last_data_date.as_deref()),
        Cell::opt_text(job.job_number.as_deref()),
    ]
}

fn json_cell<T: Serialize>(value: &T) -> Cell {
    match serde_json::to_string(value) {
        Ok(text) => Cell::Text(text),
        Err(_) => Cell::Empty,
    }
}

impl Report {
    /// Lay out one run's results
    ///
    /// Historical data and the fixed timing sheets are always present; current
    /// and event sheets only when those requests were enabled.
    pub fn from_results(results: &RunResults) -> Self {
        let enabled = |kind: TimeRequestKind| {
            kind == TimeRequestKind::Historical || results.time_requests.contains(&kind)
        };
        let mut sheets = Vec::new();

        let mut jobs = Sheet::new(JOBS_SHEET, &JOBS_HEADER);
        for job in &results.jobs {
            jobs.push_row(job_row(job));
        }
        sheets.push(jobs);

        let mut attributes = Sheet::new(ATTRIBUTES_SHEET, &ATTRIBUTES_HEADER);
        for row in &results.attributes {
            attributes.push_row(vec![Cell::Text(row.job_id.clone()), json_cell(&row.attribute)]);
        }
        sheets.push(attributes);

        for kind in [TimeRequestKind::Historical, TimeRequestKind::Current, TimeRequestKind::Events] {
            if !enabled(kind) {
                continue;
            }
            let (name, header) = data_sheet(kind);
            let mut sheet = Sheet::new(name, &header);
            for row in results.time_data_of(kind) {
                sheet.push_row(vec![Cell::Text(row.job_id.clone()), json_cell(&row.data)]);
            }
            sheets.push(sheet);
        }

        for phase in Phase::ALL {
            let skip = match phase {
                Phase::CurrentPull => !enabled(TimeRequestKind::Current),
                Phase::EventPull => !enabled(TimeRequestKind::Events),
                _ => false,
            };
            if skip {
                continue;
            }
            let (name, header) = timing_sheet(phase);
            let mut sheet = Sheet::new(name, &[header]);
            for sample in results.timing.phase(phase) {
                sheet.push_row(vec![Cell::Number(sample.seconds())]);
            }
            sheets.push(sheet);
        }

        let mut issues = Sheet::new(ISSUES_SHEET, &ISSUES_HEADER);
        for sample in results.timing.issues() {
            issues.push_row(vec![Cell::Text(sample.subject.clone()), Cell::Number(sample.seconds())]);
        }
        sheets.push(issues);

        Report { sheets }
    }
}
