//! HTTP adapter over the sales pipeline.
//!
//! Each request runs a fresh pipeline on the blocking pool; handlers share
//! nothing but the immutable [`PipelineConfig`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sales_core::error::SalesError;
use sales_core::models::{ChartData, SalesRecord, Summary};
use sales_core::settings::PipelineConfig;
use sales_data::analysis::{AnalysisResult, PipelineOutcome, ReportStatus, SalesPipeline};
use sales_data::report::ReportWriter;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Outcome of the report regeneration a request triggered: `written` or `failed`.
pub const REPORT_STATUS_HEADER: HeaderName = HeaderName::from_static("x-report-status");

const HOME_PAGE: &str = "<h2>Retail Data Analysis Backend</h2>\
<p>Endpoints: /summary, /charts-data, /clean-data, /download-report</p>";

// ── State ─────────────────────────────────────────────────────────────────────

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<PipelineConfig>,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failures a handler reports to the client as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// The source is missing or unreadable.
    NoData,
    /// No report has been generated yet.
    ReportNotFound,
    /// A fatal pipeline error (schema violation, row limit, I/O).
    Pipeline(SalesError),
    /// The blocking task panicked or was cancelled.
    Internal(String),
}

impl From<SalesError> for ApiError {
    fn from(err: SalesError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NoData => (StatusCode::SERVICE_UNAVAILABLE, "No data available".to_string()),
            ApiError::ReportNotFound => (StatusCode::NOT_FOUND, "Report not found".to_string()),
            ApiError::Pipeline(e) => {
                error!("Pipeline failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::Internal(msg) => {
                error!("Handler task failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the application router.
pub fn build_router(config: PipelineConfig) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/summary", get(summary))
        .route("/charts-data", get(charts_data))
        .route("/clean-data", get(clean_data))
        .route("/download-report", get(download_report))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(config))
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(config: PipelineConfig, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received; shutting down");
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// Headline totals; regenerates the report as a side effect.
async fn summary(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (summary, status): (Summary, ReportStatus) = run_pipeline(&state, |pipeline, result| {
        (result.summary(), pipeline.materialize_report(&result))
    })
    .await?;
    Ok(with_report_status(Json(summary), &status))
}

/// Chart series; regenerates the report as a side effect.
async fn charts_data(State(state): State<AppState>) -> Result<Response, ApiError> {
    let (chart, status): (ChartData, ReportStatus) = run_pipeline(&state, |pipeline, result| {
        (result.chart_data(), pipeline.materialize_report(&result))
    })
    .await?;
    Ok(with_report_status(Json(chart), &status))
}

/// A report failure leaves the JSON body intact and is only flagged in a header.
fn with_report_status(body: impl IntoResponse, status: &ReportStatus) -> Response {
    let label = if status.is_written() { "written" } else { "failed" };
    ([(REPORT_STATUS_HEADER, label)], body).into_response()
}

/// Every cleaned row.
async fn clean_data(State(state): State<AppState>) -> Result<Json<Vec<SalesRecord>>, ApiError> {
    run_pipeline(&state, |_, result| result.records).await.map(Json)
}

/// The last generated report as an attachment.
async fn download_report(State(state): State<AppState>) -> Result<Response, ApiError> {
    let writer = ReportWriter::from_config(&state.config);
    let file_name = writer.file_name();

    let bytes = tokio::task::spawn_blocking(move || writer.read_bytes())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??
        .ok_or(ApiError::ReportNotFound)?;

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Run a fresh pipeline on the blocking pool and hand the result to `f`.
async fn run_pipeline<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&SalesPipeline, AnalysisResult) -> T + Send + 'static,
    T: Send + 'static,
{
    let config = Arc::clone(&state.config);
    tokio::task::spawn_blocking(move || {
        let pipeline = SalesPipeline::new(&config);
        match pipeline.run()? {
            PipelineOutcome::NoData { .. } => Err(ApiError::NoData),
            PipelineOutcome::Completed(result) => Ok(f(&pipeline, result)),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
}

// ── Tests ─────────────────────────────────────────────────────────────────────
