//! Shared types for the retail sales analysis workspace.
//!
//! Holds the record and view models, the error taxonomy, configuration and
//! the small parsing and formatting helpers every other crate relies on.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
