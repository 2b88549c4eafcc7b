//! This library turns the cycle tables of a fatigue calculation into
//! spreadsheets: one sheet per node, one row per damaging cycle type, and a
//! total damage row at the bottom. Primarily meant for use by the
//! `cyclesheet` tool.
//!
//! Sheets are first built into a plain in-memory model, then rendered either
//! as an xlsx workbook or as a set of CSV files.

#![allow(clippy::needless_return)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

pub mod csv_out;
pub mod errors;
pub mod from_reports;
pub mod layout;
pub mod settings;
pub mod xlsx;

/// Imports the most relevant exports from the library.
pub mod prelude {
  pub use super::csv_out::*;
  pub use super::errors::*;
  pub use super::from_reports::*;
  pub use super::layout::*;
  pub use super::settings::*;
  pub use super::xlsx::*;
}
