//! CSV report writer
//!
//! A report becomes a directory with one `{sheet}.csv` per sheet. Rows are
//! written as-is, so the writer runs in flexible mode.

use csv::WriterBuilder;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, Report, ReportWriter, Sheet};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Writes each sheet to its own CSV file
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    buffer_size: usize,
}

impl Default for CsvReportWriter {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl CsvReportWriter {
    /// Writer with a custom buffer size in bytes
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self { buffer_size }
    }

    fn write_sheet(&self, sheet: &Sheet, path: &Path) -> OutputResult<()> {
        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;
        let buf_writer = BufWriter::with_capacity(self.buffer_size, file);

        let mut writer = WriterBuilder::new().flexible(true).from_writer(buf_writer);

        writer
            .write_record(&sheet.header)
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        for row in &sheet.rows {
            writer
                .write_record(row.iter().map(|cell| cell.to_field()))
                .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| OutputError::IoError(format!("Failed to flush: {}", e)))?;

        debug!("Wrote {} rows to {}", sheet.rows.len(), path.display());
        Ok(())
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_report(&self, report: &Report, path: &Path) -> OutputResult<()> {
        std::fs::create_dir_all(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;

        for sheet in &report.sheets {
            self.write_sheet(sheet, &path.join(format!("{}.csv", sheet.name)))?;
        }

        info!("Wrote {} sheets to {}", report.sheets.len(), path.display());
        Ok(())
    }
}
