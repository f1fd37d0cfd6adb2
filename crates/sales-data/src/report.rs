//! Spreadsheet report materialisation.
//!
//! Writes the grouped views into a three-sheet `.xlsx` workbook. The workbook
//! is rendered in memory, written to a temporary file beside the target and
//! renamed over it, so readers only ever see a complete report.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use sales_core::error::{Result, SalesError};
use sales_core::models::{GroupTotal, SalesViews};
use sales_core::settings::PipelineConfig;
use tempfile::NamedTempFile;
use tracing::info;

pub const COUNTRY_SHEET: &str = "Country Sales";
pub const MONTHLY_SHEET: &str = "Monthly Sales";
pub const PRODUCTS_SHEET: &str = "Top Products";

/// Header of the value column on every sheet.
pub const TOTAL_SALES_HEADER: &str = "TotalSales";

// ── ReportSheet ───────────────────────────────────────────────────────────────

/// One sheet of the report: a key column and a `TotalSales` column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSheet<'a> {
    pub name: &'static str,
    pub key_header: &'static str,
    pub rows: &'a [GroupTotal],
}

impl ReportSheet<'_> {
    pub fn headers(&self) -> [&'static str; 2] {
        [self.key_header, TOTAL_SALES_HEADER]
    }
}

/// The sheets of a report, in workbook order.
pub fn report_sheets(views: &SalesViews) -> [ReportSheet<'_>; 3] {
    [
        ReportSheet {
            name: COUNTRY_SHEET,
            key_header: "Country",
            rows: &views.countries,
        },
        ReportSheet {
            name: MONTHLY_SHEET,
            key_header: "YearMonth",
            rows: &views.months,
        },
        ReportSheet {
            name: PRODUCTS_SHEET,
            key_header: "Description",
            rows: &views.top_products,
        },
    ]
}

/// Render the report workbook to `.xlsx` bytes.
pub fn render_workbook(views: &SalesViews) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in report_sheets(views) {
        write_sheet(workbook.add_worksheet(), &sheet, &header_format)?;
    }

    workbook.save_to_buffer()
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &ReportSheet<'_>,
    header_format: &Format,
) -> std::result::Result<(), XlsxError> {
    worksheet.set_name(sheet.name)?;
    for (col, header) in (0u16..).zip(sheet.headers()) {
        worksheet.write_string_with_format(0, col, header, header_format)?;
    }
    for (row, group) in (1u32..).zip(sheet.rows) {
        worksheet.write_string(row, 0, &group.key)?;
        worksheet.write_number(row, 1, group.total_sales)?;
    }
    Ok(())
}

// ── ReportWriter ──────────────────────────────────────────────────────────────

/// Owner of the report artifact location.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.report_path)
    }

    /// Render `views` and atomically replace the artifact.
    ///
    /// Creates the parent directory when absent. Returns the artifact path.
    pub fn write(&self, views: &SalesViews) -> Result<PathBuf> {
        let bytes = render_workbook(views).map_err(|e| self.write_error(e))?;
        self.replace_atomically(&bytes)
            .map_err(|e| self.write_error(e))?;

        info!(
            "Report saved to {} ({} countries, {} months, {} products)",
            self.path.display(),
            views.countries.len(),
            views.months.len(),
            views.top_products.len(),
        );
        Ok(self.path.clone())
    }

    /// Read the artifact, or `None` when no report has been written yet.
    pub fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SalesError::FileRead {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// File name offered to downloaders.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "summary_report.xlsx".to_string())
    }

    fn replace_atomically(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // create_dir_all succeeds when another run created it first.
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn write_error(&self, err: impl std::fmt::Display) -> SalesError {
        SalesError::ReportWrite {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

// ── Workbook inspection (tests) ───────────────────────────────────────────────


// ── Tests ─────────────────────────────────────────────────────────────────────
