//! Tabular source loading for the sales pipeline.
//!
//! Reads the transactional CSV export into [`RawRecord`]s. Fields are read as
//! raw bytes and decoded with the configured [`TextEncoding`], so exports with
//! stray single-byte characters never abort ingestion.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;

use csv::{ByteRecord, ReaderBuilder};
use sales_core::error::{Result, SalesError};
use sales_core::models::{RawRecord, REQUIRED_COLUMNS};
use sales_core::settings::{PipelineConfig, TextEncoding, DEFAULT_MAX_ROWS};
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// What a source produced: rows, or an explicit "nothing to read" signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// The source was readable; the table may still be empty.
    Records(Vec<RawRecord>),
    /// The source is missing or unreadable.
    Unavailable { reason: String },
}

/// A tabular source yielding rows with the raw sales schema.
///
/// Implementations convert read failures into [`Ingested::Unavailable`] and
/// reserve `Err` for structural problems that must abort the run.
pub trait RecordSource {
    /// Short human-readable locator used in logs.
    fn describe(&self) -> String;

    /// Read every row from the source.
    fn load(&self) -> Result<Ingested>;
}

// ── CsvSource ─────────────────────────────────────────────────────────────────

/// A CSV file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    encoding: TextEncoding,
    max_rows: usize,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: TextEncoding::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.source_path)
            .with_encoding(config.encoding)
            .with_max_rows(config.max_rows)
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

}

impl RecordSource for CsvSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Ingested> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to open source {}: {}", self.path.display(), e);
                return Ok(Ingested::Unavailable {
                    reason: format!("cannot open {}: {}", self.path.display(), e),
                });
            }
        };

        let ingested = read_records(BufReader::new(file), self.encoding, self.max_rows)?;
        if let Ingested::Records(rows) = &ingested {
            debug!("Read {} rows from {}", rows.len(), self.path.display());
        }
        Ok(ingested)
    }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Parse CSV text from `reader`.
///
/// * A missing required column is a fatal [`SalesError::SchemaViolation`].
/// * More than `max_rows` data rows is a fatal [`SalesError::RowLimitExceeded`].
/// * An empty stream or a read error mid-stream yields [`Ingested::Unavailable`].
pub fn read_records<R: Read>(
    reader: R,
    encoding: TextEncoding,
    max_rows: usize,
) -> Result<Ingested> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = match rdr.byte_headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("Malformed source header: {}", e);
            return Ok(Ingested::Unavailable {
                reason: format!("malformed header: {}", e),
            });
        }
    };
    if headers.is_empty() {
        warn!("Source is empty");
        return Ok(Ingested::Unavailable {
            reason: "source is empty".to_string(),
        });
    }

    let columns = ColumnIndex::resolve(&headers, encoding)?;

    let mut rows: Vec<RawRecord> = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        match rdr.read_byte_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Malformed source after {} rows: {}", rows.len(), e);
                return Ok(Ingested::Unavailable {
                    reason: format!("malformed source: {}", e),
                });
            }
        }
        if rows.len() >= max_rows {
            return Err(SalesError::RowLimitExceeded { limit: max_rows });
        }
        rows.push(columns.extract(&record, encoding));
    }

    Ok(Ingested::Records(rows))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Field positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    invoice_no: usize,
    description: usize,
    quantity: usize,
    invoice_date: usize,
    unit_price: usize,
    customer_id: usize,
    country: usize,
}

impl ColumnIndex {
    fn resolve(headers: &ByteRecord, encoding: TextEncoding) -> Result<Self> {
        let names: Vec<String> = headers.iter().map(|h| encoding.decode(h)).collect();
        let position = |column: &str| -> Result<usize> {
            names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| SalesError::SchemaViolation {
                    column: column.to_string(),
                })
        };

        // Resolve in the canonical order so the first missing column is reported.
        let [invoice_no, description, quantity, invoice_date, unit_price, customer_id, country] =
            REQUIRED_COLUMNS;
        Ok(Self {
            invoice_no: position(invoice_no)?,
            description: position(description)?,
            quantity: position(quantity)?,
            invoice_date: position(invoice_date)?,
            unit_price: position(unit_price)?,
            customer_id: position(customer_id)?,
            country: position(country)?,
        })
    }

    fn extract(&self, record: &ByteRecord, encoding: TextEncoding) -> RawRecord {
        let text = |idx: usize| -> Option<String> {
            record
                .get(idx)
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| encoding.decode(bytes))
        };

        RawRecord {
            invoice_no: text(self.invoice_no),
            description: text(self.description),
            quantity: text(self.quantity).as_deref().and_then(parse_quantity),
            invoice_date: text(self.invoice_date),
            unit_price: text(self.unit_price).as_deref().and_then(parse_price),
            customer_id: text(self.customer_id),
            country: text(self.country).unwrap_or_default(),
        }
    }
}

/// Integer quantity; integral floats such as `"6.0"` are accepted.
fn parse_quantity(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(q) = s.parse::<i64>() {
        return Some(q);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Finite decimal price; `NaN` and infinities count as missing.
fn parse_price(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
