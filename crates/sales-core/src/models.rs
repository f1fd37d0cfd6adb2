use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column names every sales source must provide, exact and case-sensitive.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "InvoiceNo",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
];

/// Format used when a parsed invoice date is turned back into text.
/// Sub-second precision is written only when present.
pub const INVOICE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A transactional row exactly as ingested, before any cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    /// Invoice identifier; several rows share one invoice. `None` when empty.
    pub invoice_no: Option<String>,
    /// Product description; `None` when the cell was empty.
    pub description: Option<String>,
    /// Units sold; `None` when missing or not an integer.
    pub quantity: Option<i64>,
    /// Unparsed invoice timestamp text.
    pub invoice_date: Option<String>,
    /// Price per unit; `None` when missing or unparseable.
    pub unit_price: Option<f64>,
    /// Customer identifier; `None` when the cell was empty.
    pub customer_id: Option<String>,
    /// Country name; empty when the cell was empty.
    pub country: String,
}

/// A cleaned transactional row with its two derived columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "InvoiceNo")]
    pub invoice_no: Option<String>,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// `None` when the source timestamp could not be parsed.
    #[serde(rename = "InvoiceDate")]
    pub invoice_date: Option<NaiveDateTime>,
    #[serde(rename = "UnitPrice")]
    pub unit_price: f64,
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    #[serde(rename = "Country")]
    pub country: String,
    /// `quantity * unit_price`.
    #[serde(rename = "TotalSales")]
    pub total_sales: f64,
    /// Calendar bucket such as `"2011-09"`; `None` when the date is `None`.
    #[serde(rename = "YearMonth")]
    pub year_month: Option<String>,
}

impl From<&SalesRecord> for RawRecord {
    fn from(record: &SalesRecord) -> Self {
        RawRecord {
            invoice_no: record.invoice_no.clone(),
            description: Some(record.description.clone()),
            quantity: Some(record.quantity),
            invoice_date: record
                .invoice_date
                .map(|d| d.format(INVOICE_DATE_FORMAT).to_string()),
            unit_price: Some(record.unit_price),
            customer_id: Some(record.customer_id.clone()),
            country: record.country.clone(),
        }
    }
}

/// Headline scalars for one pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of `TotalSales`, rounded to 2 decimal places.
    pub total_sales: f64,
    /// Number of distinct invoices.
    pub total_orders: usize,
    /// Number of distinct customers.
    pub total_customers: usize,
}

/// Summed sales for one grouping key (a country, month or product).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub total_sales: f64,
}

impl GroupTotal {
    pub fn new(key: impl Into<String>, total_sales: f64) -> Self {
        Self {
            key: key.into(),
            total_sales,
        }
    }
}

/// Parallel label/value sequences consumed by chart widgets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Chart payload: top countries and the monthly trend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartData {
    pub countries: ChartSeries,
    pub months: ChartSeries,
}

/// The three grouped views materialised into the spreadsheet report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesViews {
    /// Every country, descending by total.
    pub countries: Vec<GroupTotal>,
    /// Every month, ascending by period.
    pub months: Vec<GroupTotal>,
    /// The ten best-selling products, descending by total.
    pub top_products: Vec<GroupTotal>,
}
