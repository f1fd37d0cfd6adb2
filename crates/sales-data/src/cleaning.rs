//! Row-level validity filters and coercions.
//!
//! Turns [`RawRecord`]s into [`SalesRecord`]s. Every row-level defect is
//! resolved here by dropping or coercing the row; nothing is surfaced to
//! callers.

use sales_core::models::{RawRecord, SalesRecord};
use sales_core::time_utils::{parse_invoice_date, year_month};
use tracing::debug;

/// Clean a raw table.
///
/// Steps, in order:
/// 1. drop rows without a customer or description;
/// 2. drop rows whose quantity is missing, zero or negative;
/// 3. parse the invoice date, keeping unparseable dates as `None`;
/// 4. treat a missing unit price as `0.0`;
/// 5. derive `total_sales = quantity * unit_price`;
/// 6. derive the `YYYY-MM` bucket from the parsed date.
///
/// Cleaning an already-clean table returns it unchanged.
pub fn clean_records(raw: Vec<RawRecord>) -> Vec<SalesRecord> {
    let rows_read = raw.len();
    let mut missing_keys = 0usize;
    let mut bad_quantity = 0usize;
    let mut bad_dates = 0usize;

    let cleaned: Vec<SalesRecord> = raw
        .into_iter()
        .filter_map(|row| {
            let (Some(customer_id), Some(description)) = (row.customer_id, row.description)
            else {
                missing_keys += 1;
                return None;
            };

            let quantity = match row.quantity {
                Some(q) if q > 0 => q,
                _ => {
                    bad_quantity += 1;
                    return None;
                }
            };

            let invoice_date = row.invoice_date.as_deref().and_then(parse_invoice_date);
            if invoice_date.is_none() {
                bad_dates += 1;
            }

            let unit_price = row.unit_price.unwrap_or(0.0);

            Some(SalesRecord {
                invoice_no: row.invoice_no,
                description,
                quantity,
                year_month: invoice_date.as_ref().map(year_month),
                invoice_date,
                unit_price,
                customer_id,
                country: row.country,
                total_sales: quantity as f64 * unit_price,
            })
        })
        .collect();

    debug!(
        "Cleaning: {} read, {} missing customer/description, {} non-positive quantity, {} unparseable dates, {} kept",
        rows_read,
        missing_keys,
        bad_quantity,
        bad_dates,
        cleaned.len(),
    );

    cleaned
}

// ── Tests ─────────────────────────────────────────────────────────────────────
