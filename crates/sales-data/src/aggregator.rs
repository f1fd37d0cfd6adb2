//! Sales aggregation over countries, months and products.
//!
//! All sums are kept at full `f64` precision; rounding happens only when a
//! view is turned into presentation values ([`SalesAggregator::summarize`],
//! [`SalesAggregator::chart_data`]).

use std::collections::{BTreeMap, HashSet};

use sales_core::formatting::round_to;
use sales_core::models::{ChartData, ChartSeries, GroupTotal, SalesRecord, SalesViews, Summary};

/// Countries shown in the chart view.
pub const CHART_TOP_COUNTRIES: usize = 5;

/// Products kept in the top-products view.
pub const TOP_PRODUCTS: usize = 10;

/// Decimal places of presentation values.
const PRESENTATION_DECIMALS: u32 = 2;

// ── SalesAggregator ───────────────────────────────────────────────────────────

/// Stateless helper computing the aggregation views of a cleaned table.
///
/// Grouped views are ordered deterministically: groups are collected by
/// ascending key, then stably sorted by total, so equal totals keep ascending
/// key order.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Headline totals: revenue, distinct invoices and distinct customers.
    pub fn summarize(records: &[SalesRecord]) -> Summary {
        let total_sales: f64 = records.iter().map(|r| r.total_sales).sum();
        // A row without an invoice number is not an order.
        let orders: HashSet<&str> = records
            .iter()
            .filter_map(|r| r.invoice_no.as_deref())
            .collect();
        let customers: HashSet<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();

        Summary {
            total_sales: round_to(total_sales, PRESENTATION_DECIMALS),
            total_orders: orders.len(),
            total_customers: customers.len(),
        }
    }

    /// Revenue per country, highest first.
    pub fn country_sales(records: &[SalesRecord]) -> Vec<GroupTotal> {
        let mut groups = Self::group_totals(records, |r| Some(r.country.as_str()));
        Self::sort_descending(&mut groups);
        groups
    }

    /// Revenue per `YYYY-MM` bucket in chronological order.
    ///
    /// Rows without a parsed date carry no bucket and are left out.
    pub fn monthly_sales(records: &[SalesRecord]) -> Vec<GroupTotal> {
        Self::group_totals(records, |r| r.year_month.as_deref())
    }

    /// Revenue per product description, highest first.
    pub fn product_sales(records: &[SalesRecord]) -> Vec<GroupTotal> {
        let mut groups = Self::group_totals(records, |r| Some(r.description.as_str()));
        Self::sort_descending(&mut groups);
        groups
    }

    /// The `n` best-selling products.
    pub fn top_products(records: &[SalesRecord], n: usize) -> Vec<GroupTotal> {
        Self::top_n(Self::product_sales(records), n)
    }

    /// Keep the first `n` rows of an already grouped and sorted view.
    pub fn top_n(mut view: Vec<GroupTotal>, n: usize) -> Vec<GroupTotal> {
        view.truncate(n);
        view
    }

    /// Views materialised into the report: every country, every month and
    /// the top ten products.
    pub fn build_views(records: &[SalesRecord]) -> SalesViews {
        SalesViews {
            countries: Self::country_sales(records),
            months: Self::monthly_sales(records),
            top_products: Self::top_products(records, TOP_PRODUCTS),
        }
    }

    /// Chart payload: the top five countries and the full monthly trend.
    pub fn chart_data(records: &[SalesRecord]) -> ChartData {
        let countries = Self::top_n(Self::country_sales(records), CHART_TOP_COUNTRIES);
        let months = Self::monthly_sales(records);
        ChartData {
            countries: Self::to_series(&countries),
            months: Self::to_series(&months),
        }
    }

    /// Convert a grouped view into parallel label/value sequences.
    pub fn to_series(view: &[GroupTotal]) -> ChartSeries {
        ChartSeries {
            labels: view.iter().map(|g| g.key.clone()).collect(),
            values: view
                .iter()
                .map(|g| round_to(g.total_sales, PRESENTATION_DECIMALS))
                .collect(),
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Sum `total_sales` per key, returned in ascending key order.
    ///
    /// Rows for which `key_fn` returns `None` are skipped.
    fn group_totals<'a>(
        records: &'a [SalesRecord],
        key_fn: impl Fn(&'a SalesRecord) -> Option<&'a str>,
    ) -> Vec<GroupTotal> {
        let mut map: BTreeMap<&str, f64> = BTreeMap::new();
        for record in records {
            if let Some(key) = key_fn(record) {
                *map.entry(key).or_insert(0.0) += record.total_sales;
            }
        }
        map.into_iter()
            .map(|(key, total)| GroupTotal::new(key, total))
            .collect()
    }

    /// Stable sort by total, highest first.
    fn sort_descending(groups: &mut [GroupTotal]) {
        groups.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
