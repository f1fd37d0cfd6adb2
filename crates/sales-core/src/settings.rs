use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default ceiling on ingested data rows.
pub const DEFAULT_MAX_ROWS: usize = 5_000_000;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Retail sales analysis service and report generator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-analysis",
    about = "Retail sales analysis service and report generator",
    version
)]
pub struct Settings {
    /// Run the HTTP service or generate the report once and exit
    #[arg(long, default_value = "serve", value_parser = ["serve", "report"])]
    pub mode: String,

    /// Path of the transactional CSV source
    #[arg(long, env = "SALES_SOURCE", default_value = "data/retail_data.csv")]
    pub source: PathBuf,

    /// Path of the generated spreadsheet report
    #[arg(
        long,
        env = "SALES_REPORT_PATH",
        default_value = "reports/summary_report.xlsx"
    )]
    pub report_path: PathBuf,

    /// Text encoding of the source file
    #[arg(long, env = "SALES_ENCODING", value_enum, default_value_t = TextEncoding::Latin1)]
    pub encoding: TextEncoding,

    /// Maximum number of data rows accepted from the source
    #[arg(long, env = "SALES_MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,

    /// Address the HTTP service binds to
    #[arg(long, env = "SALES_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port the HTTP service listens on
    #[arg(long, env = "SALES_PORT", default_value = "5000", value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Single-byte or UTF-8 decoding applied to every source field.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// ISO-8859-1: every byte maps to the code point of the same value.
    #[default]
    Latin1,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8,
}

impl TextEncoding {
    /// Decode one raw field.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

// ── PipelineConfig ─────────────────────────────────────────────────────────────

/// Everything a pipeline run needs, fixed at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub source_path: PathBuf,
    pub report_path: PathBuf,
    pub encoding: TextEncoding,
    pub max_rows: usize,
}

impl PipelineConfig {
    pub fn new(source_path: impl Into<PathBuf>, report_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            report_path: report_path.into(),
            encoding: TextEncoding::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
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

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and environment, then apply the `--debug` flag.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// `--debug` overrides the log level.
    pub fn resolve(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// The pipeline configuration described by these settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(&self.source, &self.report_path)
            .with_encoding(self.encoding)
            .with_max_rows(self.max_rows)
    }

    /// `host:port` string the HTTP service binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
