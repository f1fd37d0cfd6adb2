//! Data pipeline for the retail sales analysis workspace.
//!
//! Responsible for reading the transactional CSV source, cleaning rows,
//! aggregating sales views and materialising the spreadsheet report.

pub mod aggregator;
pub mod analysis;
pub mod cleaning;
pub mod reader;
pub mod report;

pub use sales_core as core;
