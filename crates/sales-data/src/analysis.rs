//! The sales aggregation pipeline.
//!
//! One component serves every entry point: ingest from a [`RecordSource`],
//! clean, and expose the aggregation views through an [`AnalysisResult`].
//! Report materialisation is a separate best-effort step so its failure never
//! takes the JSON views down with it.

use std::path::PathBuf;

use chrono::Utc;
use sales_core::error::Result;
use sales_core::models::{ChartData, SalesRecord, SalesViews, Summary};
use sales_core::settings::PipelineConfig;
use tracing::{info, warn};

use crate::aggregator::SalesAggregator;
use crate::cleaning::clean_records;
use crate::reader::{CsvSource, Ingested, RecordSource};
use crate::report::ReportWriter;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside each completed run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Locator of the source that was read.
    pub source: String,
    /// Rows read before cleaning.
    pub rows_read: usize,
    /// Rows left after cleaning.
    pub rows_cleaned: usize,
    /// Wall-clock seconds spent reading the source.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent cleaning.
    pub transform_time_seconds: f64,
}

/// The cleaned table of one run plus its metadata.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub records: Vec<SalesRecord>,
    pub metadata: RunMetadata,
}

impl AnalysisResult {
    pub fn summary(&self) -> Summary {
        SalesAggregator::summarize(&self.records)
    }

    pub fn chart_data(&self) -> ChartData {
        SalesAggregator::chart_data(&self.records)
    }

    pub fn views(&self) -> SalesViews {
        SalesAggregator::build_views(&self.records)
    }
}

/// Result of a run that did not hit a fatal error.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The source was missing or unreadable.
    NoData { reason: String },
    /// The source was read and cleaned (the table may be empty).
    Completed(AnalysisResult),
}

/// What happened to the report artifact during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportStatus {
    Written(PathBuf),
    Failed { reason: String },
}

impl ReportStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, ReportStatus::Written(_))
    }
}

// ── SalesPipeline ─────────────────────────────────────────────────────────────

/// Ingest → clean → aggregate, with an optional report step.
///
/// Every call to [`SalesPipeline::run`] re-reads the source; nothing is
/// cached between runs.
pub struct SalesPipeline<S = CsvSource> {
    source: S,
    report: ReportWriter,
}

impl SalesPipeline<CsvSource> {
    /// Pipeline reading the CSV file named by `config`.
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_source(CsvSource::from_config(config), ReportWriter::from_config(config))
    }
}

impl<S: RecordSource> SalesPipeline<S> {
    pub fn with_source(source: S, report: ReportWriter) -> Self {
        Self { source, report }
    }

    pub fn report_writer(&self) -> &ReportWriter {
        &self.report
    }

    /// Run ingestion and cleaning.
    ///
    /// Returns `Err` only for structural failures (schema violation, row
    /// limit); an unavailable source is [`PipelineOutcome::NoData`].
    pub fn run(&self) -> Result<PipelineOutcome> {
        let source = self.source.describe();

        let load_start = std::time::Instant::now();
        let raw = match self.source.load()? {
            Ingested::Records(rows) => rows,
            Ingested::Unavailable { reason } => {
                warn!("No data available from {}: {}", source, reason);
                return Ok(PipelineOutcome::NoData { reason });
            }
        };
        let load_time = load_start.elapsed().as_secs_f64();
        let rows_read = raw.len();

        let transform_start = std::time::Instant::now();
        let records = clean_records(raw);
        let transform_time = transform_start.elapsed().as_secs_f64();

        let metadata = RunMetadata {
            generated_at: Utc::now().to_rfc3339(),
            source,
            rows_read,
            rows_cleaned: records.len(),
            load_time_seconds: load_time,
            transform_time_seconds: transform_time,
        };
        info!(
            "Loaded and cleaned {} of {} rows from {} (load {:.3}s, clean {:.3}s)",
            metadata.rows_cleaned,
            metadata.rows_read,
            metadata.source,
            metadata.load_time_seconds,
            metadata.transform_time_seconds,
        );

        Ok(PipelineOutcome::Completed(AnalysisResult { records, metadata }))
    }

    /// Write the report for `result`, logging instead of failing.
    pub fn materialize_report(&self, result: &AnalysisResult) -> ReportStatus {
        match self.report.write(&result.views()) {
            Ok(path) => ReportStatus::Written(path),
            Err(e) => {
                warn!("Report generation failed: {}", e);
                ReportStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::workbook_xml;
    use sales_core::error::SalesError;
    use sales_core::models::{GroupTotal, RawRecord};
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: &str = "InvoiceNo,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// In-memory source standing in for an alternate backend.
    struct StaticSource(Vec<RawRecord>);

    impl RecordSource for StaticSource {
        fn describe(&self) -> String {
            "static".to_string()
        }

        fn load(&self) -> Result<Ingested> {
            Ok(Ingested::Records(self.0.clone()))
        }
    }

    fn write_source(dir: &Path, rows: &[&str]) -> PipelineConfig {
        let source = dir.join("retail_data.csv");
        let mut body = format!("{HEADER}\n");
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        std::fs::write(&source, body).unwrap();
        PipelineConfig::new(source, dir.join("reports").join("summary_report.xlsx"))
    }

    fn completed(outcome: PipelineOutcome) -> AnalysisResult {
        match outcome {
            PipelineOutcome::Completed(result) => result,
            PipelineOutcome::NoData { reason } => panic!("unexpected no data: {reason}"),
        }
    }

    // ── Scenarios ─────────────────────────────────────────────────────────────

    #[test]
    fn test_scenario_null_customer_dropped() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(
            tmp.path(),
            &["100,A,2,2020-01-05,5.0,1,US", "101,B,1,2020-01-06,3.0,,US"],
        );

        let result = completed(SalesPipeline::new(&config).run().unwrap());
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].invoice_no.as_deref(), Some("100"));
        assert_eq!(
            result.summary(),
            Summary {
                total_sales: 10.0,
                total_orders: 1,
                total_customers: 1,
            }
        );
        assert_eq!(result.metadata.rows_read, 2);
        assert_eq!(result.metadata.rows_cleaned, 1);
    }

    #[test]
    fn test_scenario_country_order() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(
            tmp.path(),
            &["1,A,2,2020-01-05,5.0,1,US", "2,B,4,2020-01-06,5.0,2,UK"],
        );

        let result = completed(SalesPipeline::new(&config).run().unwrap());
        let views = result.views();
        assert_eq!(
            views.countries,
            vec![GroupTotal::new("UK", 20.0), GroupTotal::new("US", 10.0)]
        );
    }

    #[test]
    fn test_scenario_negative_quantity_dropped() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(
            tmp.path(),
            &["1,A,-1,2020-01-05,5.0,1,US", "2,B,1,2020-01-06,5.0,2,US"],
        );

        let result = completed(SalesPipeline::new(&config).run().unwrap());
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].invoice_no.as_deref(), Some("2"));
    }

    #[test]
    fn test_scenario_report_reflects_latest_run() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(tmp.path(), &["1,A,1,2020-01-05,5.0,1,US"]);
        let pipeline = SalesPipeline::new(&config);

        let first = completed(pipeline.run().unwrap());
        assert!(pipeline.materialize_report(&first).is_written());

        write_source(tmp.path(), &["7,Z,3,2021-06-01,2.0,9,Japan"]);
        let second = completed(pipeline.run().unwrap());
        assert!(pipeline.materialize_report(&second).is_written());
        let bytes = pipeline.report_writer().read_bytes().unwrap().unwrap();

        assert_eq!(
            workbook_xml::sheet_names(&bytes),
            vec!["Country Sales", "Monthly Sales", "Top Products"]
        );
        assert_eq!(
            workbook_xml::data_rows(&bytes, 1),
            vec![("Japan".to_string(), 6.0)]
        );
        assert_eq!(
            workbook_xml::data_rows(&bytes, 2),
            vec![("2021-06".to_string(), 6.0)]
        );
        assert_eq!(
            workbook_xml::data_rows(&bytes, 3),
            vec![("Z".to_string(), 6.0)]
        );
        let strings = workbook_xml::shared_strings(&bytes);
        assert!(!strings.iter().any(|s| s == "US" || s == "2020-01"));
    }

    // ── Edge cases ────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_table_yields_zero_summary() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(tmp.path(), &[]);

        let result = completed(SalesPipeline::new(&config).run().unwrap());
        assert_eq!(result.summary(), Summary::default());
        let chart = result.chart_data();
        assert!(chart.countries.labels.is_empty());
        assert!(chart.countries.values.is_empty());
        assert!(chart.months.labels.is_empty());
        assert!(chart.months.values.is_empty());
    }

    #[test]
    fn test_all_rows_filtered_still_writes_report() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(tmp.path(), &["1,A,0,2020-01-05,5.0,1,US"]);
        let pipeline = SalesPipeline::new(&config);

        let result = completed(pipeline.run().unwrap());
        assert!(result.records.is_empty());
        assert!(pipeline.materialize_report(&result).is_written());
    }

    #[test]
    fn test_missing_source_is_no_data() {
        let tmp = TempDir::new().unwrap();
        let config = PipelineConfig::new(tmp.path().join("absent.csv"), tmp.path().join("r.xlsx"));

        let outcome = SalesPipeline::new(&config).run().unwrap();
        assert!(matches!(outcome, PipelineOutcome::NoData { .. }));
    }

    #[test]
    fn test_schema_violation_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("bad.csv");
        std::fs::write(&source, "InvoiceNo,Description,Quantity\n1,A,1\n").unwrap();
        let config = PipelineConfig::new(source, tmp.path().join("r.xlsx"));

        let err = SalesPipeline::new(&config).run().unwrap_err();
        assert!(matches!(err, SalesError::SchemaViolation { .. }));
    }

    #[test]
    fn test_report_failure_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let pipeline = SalesPipeline::with_source(
            StaticSource(vec![RawRecord {
                invoice_no: Some("1".to_string()),
                description: Some("A".to_string()),
                quantity: Some(1),
                invoice_date: Some("2020-01-05".to_string()),
                unit_price: Some(2.0),
                customer_id: Some("1".to_string()),
                country: "US".to_string(),
            }]),
            ReportWriter::new(blocker.join("r.xlsx")),
        );

        let result = completed(pipeline.run().unwrap());
        let status = pipeline.materialize_report(&result);
        assert!(matches!(status, ReportStatus::Failed { .. }));
        assert_eq!(result.summary().total_sales, 2.0);
    }

    #[test]
    fn test_sum_invariant_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let config = write_source(
            tmp.path(),
            &[
                "1,A,3,12/1/2010 8:26,2.55,17850,United Kingdom",
                "1,B,6,12/1/2010 8:26,3.39,17850,United Kingdom",
                "2,C,12,12/2/2010 9:00,1.65,12583,France",
                "3,A,1,not-a-date,2.55,12583,France",
                "4,D,2,1/5/2011 10:15,,13047,Germany",
            ],
        );

        let result = completed(SalesPipeline::new(&config).run().unwrap());
        let views = result.views();
        let country_total: f64 = views.countries.iter().map(|g| g.total_sales).sum();
        assert_eq!(
            result.summary().total_sales,
            sales_core::formatting::round_to(country_total, 2)
        );
        // The undated row counts towards countries but not towards months.
        let month_total: f64 = views.months.iter().map(|g| g.total_sales).sum();
        assert!((country_total - month_total - 2.55).abs() < 1e-9);
    }
}
