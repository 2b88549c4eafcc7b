//! This module implements utility functions to pick report lines apart. None
//! of them know anything about the meaning of the numbers within.

use std::borrow::Cow;
use std::io::{self, BufRead};

/// Absolute tolerance used when matching temperatures across tables.
pub const TEMPERATURE_TOLERANCE: f64 = 1e-2;

/// Absolute tolerance used when matching stresses across tables.
pub const STRESS_TOLERANCE: f64 = 1e-4;

/// Relative tolerance applied on top of the absolute ones.
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Checks whether two reals are close: within an absolute tolerance, or
/// within a tiny relative one for large magnitudes.
pub fn is_close(a: f64, b: f64, abs_tol: f64) -> bool {
  if a == b {
    return true;
  }
  if !a.is_finite() || !b.is_finite() {
    return false;
  }
  let diff = (a - b).abs();
  return diff <= (RELATIVE_TOLERANCE * a.abs().max(b.abs())).max(abs_tol);
}

/// The reports use commas as decimal separators. This swaps them for dots,
/// only allocating when there's something to swap.
pub fn normalise_decimals(line: &str) -> Cow<'_, str> {
  if line.contains(',') {
    return Cow::Owned(line.replace(',', "."));
  }
  return Cow::Borrowed(line);
}

/// Parses the n-th whitespace-separated field as a natural number.
pub(crate) fn nth_natural(fields: &[&str], n: usize) -> Option<usize> {
  return fields.get(n)?.parse().ok();
}

/// Parses the n-th whitespace-separated field as a real number.
pub(crate) fn nth_real(fields: &[&str], n: usize) -> Option<f64> {
  return fields.get(n)?.parse().ok();
}

/// Parses the n-th field counting from the end (1 is the last one).
pub(crate) fn nth_last_real(fields: &[&str], n: usize) -> Option<f64> {
  let ix = fields.len().checked_sub(n)?;
  return nth_real(fields, ix);
}

/// The shape of a block header line: a fixed marker, then an optional colon,
/// then an integer, then optionally a fixed trailer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HeaderPattern {
  /// Text that precedes the value.
  pub marker: &'static str,
  /// Text that must follow the value, if any.
  pub trailer: Option<&'static str>
}

impl HeaderPattern {
  /// A pattern with just a marker.
  pub const fn new(marker: &'static str) -> Self {
    return Self { marker, trailer: None };
  }

  /// A pattern whose value must be followed by a trailer.
  pub const fn with_trailer(
    marker: &'static str,
    trailer: &'static str
  ) -> Self {
    return Self { marker, trailer: Some(trailer) };
  }

  /// Extracts the integer value from a line, if it has this shape.
  pub fn value(&self, line: &str) -> Option<usize> {
    let start = line.find(self.marker)? + self.marker.len();
    let rest = line[start..].trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start();
    let end = rest
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(rest.len());
    if end == 0 {
      return None;
    }
    let value = rest[..end].parse().ok()?;
    if let Some(trailer) = self.trailer {
      if !rest[end..].trim_start().starts_with(trailer) {
        return None;
      }
    }
    return Some(value);
  }
}

/// Returns the value of the first pattern that matches a line.
pub fn header_value(patterns: &[HeaderPattern], line: &str) -> Option<usize> {
  return patterns.iter().find_map(|p| p.value(line));
}

/// Feeds every line of a reader into a closure, along with its 1-based
/// number. Lines are decoded lossily: label lines in these reports are not
/// always UTF-8, and we never need their text. Returns the number of lines.
pub(crate) fn try_for_each_line<R, E, F>(
  mut reader: R,
  mut f: F
) -> Result<usize, E>
where
  R: BufRead,
  E: From<io::Error>,
  F: FnMut(usize, &str) -> Result<(), E>
{
  let mut buf: Vec<u8> = Vec::new();
  let mut count = 0;
  loop {
    buf.clear();
    if reader.read_until(b'\n', &mut buf)? == 0 {
      break;
    }
    count += 1;
    let line = String::from_utf8_lossy(&buf);
    f(count, line.trim_end_matches(|c| c == '\r' || c == '\n'))?;
  }
  return Ok(count);
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  #[test]
  fn closeness_is_absolute_for_small_values() {
    assert!(is_close(140.0, 140.00009, STRESS_TOLERANCE));
    assert!(!is_close(140.0, 140.0002, STRESS_TOLERANCE));
    assert!(is_close(20.0, 20.009, TEMPERATURE_TOLERANCE));
    assert!(!is_close(20.0, 20.02, TEMPERATURE_TOLERANCE));
    assert!(!is_close(f64::NAN, f64::NAN, 1.0));
  }

  #[test]
  fn header_values() {
    let node = HeaderPattern::new("> Calculation node");
    assert_eq!(node.value("> Calculation node 101"), Some(101));
    assert_eq!(node.value("  > Calculation node: 42  "), Some(42));
    assert_eq!(node.value("> Calculation node: none"), None);
    assert_eq!(node.value("Calculation node: 42"), None);
    let moment = HeaderPattern::with_trailer(
      ">>moment",
      "-> calculation results Table"
    );
    assert_eq!(
      moment.value(">>moment 7 -> calculation results Table"),
      Some(7)
    );
    assert_eq!(moment.value(">>moment 7 -> something else"), None);
  }

  #[test]
  fn decimal_commas() {
    let line = normalise_decimals("1 20,5 -3,25");
    let fields = line.split_whitespace().collect::<Vec<_>>();
    assert_eq!(nth_natural(&fields, 0), Some(1));
    assert_eq!(nth_real(&fields, 1), Some(20.5));
    assert_eq!(nth_last_real(&fields, 1), Some(-3.25));
    assert_eq!(nth_last_real(&fields, 4), None);
    assert_eq!(nth_natural(&fields, 1), None);
  }

  #[test]
  fn lossy_lines() {
    let bytes: &[u8] = b"first\r\n\xcf\xf0\xe8\n> Calculation node 3";
    let mut seen = Vec::new();
    let n = try_for_each_line(Cursor::new(bytes), |i, l| {
      seen.push((i, l.to_string()));
      return Ok::<(), io::Error>(());
    }).unwrap();
    assert_eq!(n, 3);
    assert_eq!(seen[0], (1, "first".to_string()));
    assert_eq!(seen[2], (3, "> Calculation node 3".to_string()));
  }
}
