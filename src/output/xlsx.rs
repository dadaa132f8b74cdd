//! XLSX report writer

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use tracing::{info, warn};

use super::{Cell, OutputError, OutputResult, Report, ReportWriter, Sheet};

/// Longest string Excel stores in one cell
pub const MAX_CELL_CHARS: usize = 32_767;

fn xlsx_err(e: XlsxError) -> OutputError {
    OutputError::XlsxError(e.to_string())
}

/// Cut `text` to at most `max` characters
pub fn truncate_cell(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Writes a report as one workbook, one worksheet per sheet
#[derive(Debug, Clone, Default)]
pub struct XlsxReportWriter;

impl XlsxReportWriter {
    fn add_sheet(workbook: &mut Workbook, sheet: &Sheet, bold: &Format) -> OutputResult<()> {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name).map_err(xlsx_err)?;

        for (col, title) in sheet.header.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, title, bold)
                .map_err(xlsx_err)?;
        }

        for (idx, row) in sheet.rows.iter().enumerate() {
            let row_num = (idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(text) => {
                        let stored = truncate_cell(text, MAX_CELL_CHARS);
                        if stored.len() < text.len() {
                            warn!(
                                "Cell {}!R{}C{} truncated to {} characters",
                                sheet.name,
                                row_num + 1,
                                col + 1,
                                MAX_CELL_CHARS
                            );
                        }
                        worksheet.write_string(row_num, col, stored).map_err(xlsx_err)?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row_num, col, *n).map_err(xlsx_err)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        Ok(())
    }
}

impl ReportWriter for XlsxReportWriter {
    fn write_report(&self, report: &Report, path: &Path) -> OutputResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {}", e)))?;
        }

        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        for sheet in &report.sheets {
            Self::add_sheet(&mut workbook, sheet, &bold)?;
        }

        workbook.save(path).map_err(xlsx_err)?;
        info!("Wrote {} sheets to {}", report.sheets.len(), path.display());
        Ok(())
    }
}
