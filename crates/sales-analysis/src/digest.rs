//! Console digest printed by `--mode report`.

use std::fmt::Write;

use sales_core::formatting::{format_count, format_currency, percentage};
use sales_core::models::GroupTotal;
use sales_data::aggregator::SalesAggregator;
use sales_data::analysis::{AnalysisResult, ReportStatus};

/// Countries listed in the digest.
pub const DIGEST_COUNTRIES: usize = 5;
/// Months listed in the digest, from the start of the trend.
pub const DIGEST_MONTHS: usize = 5;

/// Render the digest for a completed run.
pub fn render_digest(result: &AnalysisResult, report: &ReportStatus) -> String {
    let summary = result.summary();
    let views = result.views();
    let mut out = String::new();

    let _ = writeln!(out, "Quick Summary");
    let _ = writeln!(out, "  Total sales:     {}", format_currency(summary.total_sales));
    let _ = writeln!(out, "  Total orders:    {}", format_count(summary.total_orders));
    let _ = writeln!(out, "  Total customers: {}", format_count(summary.total_customers));
    let _ = writeln!(
        out,
        "  Rows cleaned:    {} of {}",
        format_count(result.metadata.rows_cleaned),
        format_count(result.metadata.rows_read)
    );

    let _ = writeln!(out, "\nTop {} Countries by Revenue", DIGEST_COUNTRIES);
    let countries = SalesAggregator::top_n(views.countries, DIGEST_COUNTRIES);
    for group in &countries {
        let share = percentage(group.total_sales, summary.total_sales, 1);
        let _ = writeln!(
            out,
            "  {:<24} {:>16} {:>6.1}%",
            group.key,
            format_currency(group.total_sales),
            share
        );
    }

    let _ = writeln!(out, "\nMonthly Sales Trend");
    write_rows(&mut out, views.months.iter().take(DIGEST_MONTHS));

    let _ = writeln!(out, "\nTop {} Products by Sales", views.top_products.len());
    write_rows(&mut out, views.top_products.iter());

    match report {
        ReportStatus::Written(path) => {
            let _ = writeln!(out, "\nSummary report saved to: {}", path.display());
        }
        ReportStatus::Failed { reason } => {
            let _ = writeln!(out, "\nSummary report was not saved: {}", reason);
        }
    }

    out
}

fn write_rows<'a>(out: &mut String, rows: impl Iterator<Item = &'a GroupTotal>) {
    for group in rows {
        let _ = writeln!(out, "  {:<36} {:>16}", group.key, format_currency(group.total_sales));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sales_core::models::SalesRecord;
    use sales_data::analysis::RunMetadata;
    use std::path::PathBuf;

    fn record(invoice: &str, country: &str, description: &str, month: u32, total: f64) -> SalesRecord {
        let date = NaiveDate::from_ymd_opt(2011, month, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        SalesRecord {
            invoice_no: Some(invoice.to_string()),
            description: description.to_string(),
            quantity: 1,
            invoice_date: Some(date),
            unit_price: total,
            customer_id: format!("C{invoice}"),
            country: country.to_string(),
            total_sales: total,
            year_month: Some(format!("2011-{month:02}")),
        }
    }

    fn result(records: Vec<SalesRecord>) -> AnalysisResult {
        AnalysisResult {
            metadata: RunMetadata {
                generated_at: "2011-12-31T00:00:00+00:00".to_string(),
                source: "memory".to_string(),
                rows_read: records.len() + 1,
                rows_cleaned: records.len(),
                load_time_seconds: 0.0,
                transform_time_seconds: 0.0,
            },
            records,
        }
    }

    #[test]
    fn test_digest_sections_and_shares() {
        let records = vec![
            record("1", "United Kingdom", "MUG", 1, 1500.0),
            record("2", "France", "LANTERN", 2, 500.0),
        ];
        let status = ReportStatus::Written(PathBuf::from("reports/summary_report.xlsx"));
        let text = render_digest(&result(records), &status);

        assert!(text.contains("Total sales:     $2,000.00"));
        assert!(text.contains("Total orders:    2"));
        assert!(text.contains("Rows cleaned:    2 of 3"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("25.0%"));
        assert!(text.contains("2011-01"));
        assert!(text.contains("Top 2 Products by Sales"));
        assert!(text.contains("Summary report saved to: reports/summary_report.xlsx"));

        let uk = text.find("United Kingdom").unwrap();
        let fr = text.find("France").unwrap();
        assert!(uk < fr);
    }

    #[test]
    fn test_digest_caps_countries_and_months() {
        let records: Vec<SalesRecord> = (1..=7)
            .map(|i| record(&i.to_string(), &format!("Country{i}"), "MUG", i, i as f64))
            .collect();
        let status = ReportStatus::Written(PathBuf::from("r.xlsx"));
        let text = render_digest(&result(records), &status);

        assert!(text.contains("Country7"));
        assert!(!text.contains("Country2 "));
        assert!(text.contains("2011-05"));
        assert!(!text.contains("2011-06"));
    }

    #[test]
    fn test_digest_reports_write_failure() {
        let status = ReportStatus::Failed {
            reason: "permission denied".to_string(),
        };
        let text = render_digest(&result(Vec::new()), &status);
        assert!(text.contains("Total sales:     $0.00"));
        assert!(text.contains("Summary report was not saved: permission denied"));
    }
}
