//! Runtime layer for the retail sales analysis service.
//!
//! Exposes the pipeline over HTTP. Each request performs a fresh run.

pub mod server;

pub use sales_core as core;
pub use sales_data as data;
