//! Report output
//!
//! A run is exported as a [`Report`]: an ordered list of named [`Sheet`]s,
//! each with a fixed header and untyped rows. Writers turn a report into an
//! XLSX workbook or a directory of CSV files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub mod csv;
pub mod path;
pub mod sheets;
pub mod xlsx;

pub use path::report_path;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Workbook write error
    #[error("XLSX error: {0}")]
    XlsxError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text value
    Text(String),
    /// Numeric value (durations in seconds)
    Number(f64),
    /// Missing value
    Empty,
}

impl Cell {
    /// Text cell, or [`Cell::Empty`] when absent
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    /// Value as it appears in a CSV field
    pub fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Named table with a fixed header
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Sheet (or CSV file) name
    pub name: String,
    /// Column titles
    pub header: Vec<String>,
    /// Rows; widths are not checked against the header
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Empty sheet named `name` with `header`
    pub fn new(name: impl Into<String>, header: &[&str]) -> Self {
        Self {
            name: name.into(),
            header: header.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append one row
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

/// Ordered collection of sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Sheets in output order
    pub sheets: Vec<Sheet>,
}

impl Report {
    /// Sheet named `name`, if present
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Sheet names in output order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Report file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One XLSX workbook
    #[default]
    Xlsx,
    /// One directory with a CSV file per sheet
    Csv,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xlsx => write!(f, "xlsx"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Invalid output format: {s}. Valid options: xlsx, csv")),
        }
    }
}

/// Writes a whole report to one destination
pub trait ReportWriter {
    /// Write `report` to `path`, replacing what is there
    fn write_report(&self, report: &Report, path: &Path) -> OutputResult<()>;
}

/// Writer for `format`
pub fn writer_for(format: OutputFormat) -> Box<dyn ReportWriter> {
    match format {
        OutputFormat::Xlsx => Box::new(xlsx::XlsxReportWriter::default()),
        OutputFormat::Csv => Box::new(csv::CsvReportWriter::default()),
    }
}
