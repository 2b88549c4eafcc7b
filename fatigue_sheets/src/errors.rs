//! Errors that can come up while writing sheets out.

use std::io;

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Something went wrong while writing a workbook or its CSV files.
#[derive(Debug, Error)]
pub enum SaveError {
  /// Plain I/O trouble.
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
  /// The xlsx writer refused something.
  #[error("could not build the workbook: {0}")]
  Xlsx(#[from] XlsxError),
  /// The CSV writer refused something.
  #[error("could not write CSV: {0}")]
  Csv(#[from] csv::Error),
  /// The CSV delimiter must be a single byte.
  #[error("delimiter {0:?} is not an ASCII character")]
  BadDelimiter(char)
}
