//! Report file naming
//!
//! Each run writes `{counter} - API Time Tester-interval({interval})` inside
//! the output directory, with `.xlsx` appended for workbooks. CSV reports use
//! the bare stem as a directory name.

use std::path::{Path, PathBuf};

use super::OutputFormat;

/// Fixed part of every report name
pub const REPORT_TITLE: &str = "API Time Tester";

/// Interval as written in the file name; whole numbers drop the fraction
pub fn format_interval(interval: f64) -> String {
    if interval.fract() == 0.0 && interval.abs() < 1e15 {
        format!("{}", interval as i64)
    } else {
        interval.to_string()
    }
}

/// File stem for run `counter`
pub fn report_stem(counter: u32, interval: f64) -> String {
    format!("{counter} - {REPORT_TITLE}-interval({})", format_interval(interval))
}

/// Destination of run `counter`'s report inside `dir`
pub fn report_path(dir: &Path, counter: u32, interval: f64, format: OutputFormat) -> PathBuf {
    let stem = report_stem(counter, interval);
    match format {
        OutputFormat::Xlsx => dir.join(format!("{stem}.xlsx")),
        OutputFormat::Csv => dir.join(stem),
    }
}
