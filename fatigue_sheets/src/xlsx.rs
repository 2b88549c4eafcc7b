//! This module renders sheets into an xlsx workbook and saves it.

use std::io::{self, Write};
use std::path::Path;

use log::*;
use rust_xlsxwriter::{
  Color, Format, FormatAlign, FormatBorder, Formula, Workbook as XlsxWorkbook,
  Worksheet, XlsxError
};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// What happened to a save.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SaveOutcome {
  /// The workbook was written.
  Saved,
  /// The destination couldn't be replaced, most likely because it's open in
  /// another program. Nothing was written.
  Locked
}

/// The base cell format: centred, wrapped, thin borders.
fn cell_format() -> Format {
  return Format::new()
    .set_font_name("Times New Roman")
    .set_font_size(12)
    .set_border(FormatBorder::Thin)
    .set_align(FormatAlign::Center)
    .set_align(FormatAlign::VerticalCenter)
    .set_text_wrap();
}

/// Writes one sheet into a worksheet.
fn render_sheet(sheet: &Sheet, ws: &mut Worksheet) -> Result<(), XlsxError> {
  ws.set_name(&sheet.name)?;
  if sheet.flagged {
    ws.set_tab_color(Color::Red);
  }
  if sheet.is_empty() {
    return Ok(());
  }
  let base = cell_format();
  let formats = Column::all()
    .iter()
    .map(|col| base.clone().set_num_format(col.number_format()))
    .collect::<Vec<_>>();
  // header
  for col in Column::all() {
    let c = col.index() as u16;
    ws.set_column_width(c, col.width())?;
    ws.write_string_with_format(0, c, col.header(), &base)?;
  }
  // rows
  for (i, row) in sheet.rows.iter().enumerate() {
    let r = (i + 1) as u32;
    for (c, cell) in row.cells().iter().enumerate() {
      match cell {
        SheetCell::Text(s) => ws.write_string_with_format(r, c as u16, s, &base)?,
        SheetCell::Number(x) => {
          ws.write_number_with_format(r, c as u16, *x, &formats[c])?
        }
      };
    }
  }
  // total
  let last = (sheet.rows.len() + 1) as u32;
  let damage_col = Column::A.index() as u16;
  ws.merge_range(last, 0, last, damage_col - 1, TOTAL_LABEL, &base)?;
  ws.write_formula_with_format(
    last,
    damage_col,
    Formula::new(format!("=SUM(J2:J{})", last)),
    &formats[Column::A.index()]
  )?;
  return Ok(());
}

/// Renders sheets into an xlsx workbook.
pub fn render(book: &Workbook) -> Result<XlsxWorkbook, XlsxError> {
  let mut xl = XlsxWorkbook::new();
  for sheet in &book.sheets {
    render_sheet(sheet, xl.add_worksheet())?;
  }
  return Ok(xl);
}

/// Renders sheets into the bytes of an xlsx file.
pub fn to_bytes(book: &Workbook) -> Result<Vec<u8>, XlsxError> {
  return render(book)?.save_to_buffer();
}

/// Saves sheets as an xlsx file. The file is first written next to the
/// destination, then moved over it, so a failed save leaves any previous
/// file alone.
pub fn save_workbook<P: AsRef<Path>>(
  book: &Workbook,
  path: P
) -> Result<SaveOutcome, SaveError> {
  let path = path.as_ref();
  let bytes = to_bytes(book)?;
  let dir = match path.parent() {
    Some(d) if !d.as_os_str().is_empty() => d,
    _ => Path::new(".")
  };
  let mut tmp = tempfile::Builder::new()
    .prefix(".cyclesheet")
    .suffix(".xlsx")
    .tempfile_in(dir)?;
  tmp.write_all(&bytes)?;
  tmp.flush()?;
  // a failed persist drops the temporary file, which removes it
  return match tmp.persist(path) {
    Ok(_) => {
      info!("Wrote {} sheets to {}.", book.len(), path.display());
      Ok(SaveOutcome::Saved)
    },
    Err(e) => persist_failure(path, e.error)
  };
}

/// Decides what a failure to move the file into place means.
fn persist_failure(path: &Path, err: io::Error) -> Result<SaveOutcome, SaveError> {
  if err.kind() == io::ErrorKind::PermissionDenied {
    error!(
      "Could not write {}, please close it in any other program.",
      path.display()
    );
    return Ok(SaveOutcome::Locked);
  }
  return Err(SaveError::Io(err));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn denied_destinations_are_locked() {
    let path = Path::new("table.xlsx");
    let denied = io::Error::from(io::ErrorKind::PermissionDenied);
    assert_eq!(persist_failure(path, denied).unwrap(), SaveOutcome::Locked);
    let missing = io::Error::from(io::ErrorKind::NotFound);
    assert!(matches!(persist_failure(path, missing), Err(SaveError::Io(_))));
  }
}
