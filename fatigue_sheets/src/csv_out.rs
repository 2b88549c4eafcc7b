//! This module writes sheets out as CSV, one file per sheet.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::*;

use crate::prelude::*;

/// Writes a sheet as CSV: the header, the rows, then the total. An empty
/// sheet writes nothing.
pub fn write_sheet<W: Write>(
  sheet: &Sheet,
  output: W,
  delim: char
) -> Result<(), SaveError> {
  if !delim.is_ascii() {
    return Err(SaveError::BadDelimiter(delim));
  }
  let mut wtr = csv::WriterBuilder::new()
    .delimiter(delim as u8)
    .from_writer(output);
  if !sheet.is_empty() {
    wtr.write_record(Column::all().iter().map(|c| c.header()))?;
    for row in &sheet.rows {
      wtr.write_record(row.cells().iter().map(|c| c.to_string()))?;
    }
    let mut total = vec![String::new(); Column::all().len()];
    total[0] = TOTAL_LABEL.to_string();
    total[Column::A.index()] = sheet.total_damage().to_string();
    wtr.write_record(&total)?;
  }
  wtr.flush()?;
  return Ok(());
}

/// Writes every sheet to `{dir}/{stem}_{sheet}.csv`, returning the paths.
pub fn write_sheets<P: AsRef<Path>>(
  book: &Workbook,
  dir: P,
  stem: &str,
  delim: char
) -> Result<Vec<PathBuf>, SaveError> {
  let mut written = Vec::with_capacity(book.len());
  for sheet in &book.sheets {
    let path = dir.as_ref().join(format!("{}_{}.csv", stem, sheet.name));
    debug!("Writing sheet {} to {}...", sheet.name, path.display());
    let file = BufWriter::new(File::create(&path)?);
    write_sheet(sheet, file, delim)?;
    written.push(path);
  }
  info!("Wrote {} CSV files.", written.len());
  return Ok(written);
}
