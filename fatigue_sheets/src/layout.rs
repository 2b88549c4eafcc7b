//! This submodule implements the in-memory layout of cycle sheets.

use std::fmt::Display;

use fatigue::prelude::*;
use serde::{Deserialize, Serialize};

/// Label of the last row of a sheet.
pub const TOTAL_LABEL: &str = "Total accumulated fatigue damage";

/// The columns of a cycle sheet, left to right.
#[derive(
  Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord
)]
pub enum Column {
  /// The endpoints of the cycle type.
  CycleType,
  /// Maximum stress.
  SfMax,
  /// Minimum stress.
  SfMin,
  /// Stress amplitude.
  Saf,
  /// Temperature at the minimum.
  Tmin,
  /// Temperature at the maximum.
  Tmax,
  /// Stress ratio.
  R,
  /// Allowable number of cycles.
  Ndop,
  /// Applied number of cycles.
  N,
  /// Damage.
  A
}

impl Column {
  /// Returns all the columns, in order.
  pub const fn all() -> &'static [Self] {
    return &[
      Self::CycleType,
      Self::SfMax,
      Self::SfMin,
      Self::Saf,
      Self::Tmin,
      Self::Tmax,
      Self::R,
      Self::Ndop,
      Self::N,
      Self::A
    ];
  }

  /// The header cell text.
  pub const fn header(&self) -> &'static str {
    return match self {
      Self::CycleType => "Cycle type",
      Self::SfMax => "σFmax",
      Self::SfMin => "σFmin",
      Self::Saf => "σaF",
      Self::Tmin => "Tmin",
      Self::Tmax => "Tmax",
      Self::R => "r",
      Self::Ndop => "[N]",
      Self::N => "N",
      Self::A => "a"
    };
  }

  /// Width of the column, in characters.
  pub const fn width(&self) -> f64 {
    return match self {
      Self::CycleType => 12.0,
      Self::R => 8.0,
      Self::Ndop => 11.0,
      Self::N => 9.0,
      Self::A => 10.0,
      _ => 8.25
    };
  }

  /// The spreadsheet number format for this column's values.
  pub const fn number_format(&self) -> &'static str {
    return match self {
      Self::CycleType => "@",
      Self::R => "0.00",
      Self::N => "0.0",
      Self::A => "0.0E+0",
      _ => "0"
    };
  }

  /// Position of the column, from zero.
  pub const fn index(&self) -> usize {
    return *self as usize;
  }

  /// Takes this column's value out of a cycle. The cycle type column has no
  /// numeric value.
  pub fn value(&self, cycle: &CycleRecord) -> Option<f64> {
    return Some(match self {
      Self::CycleType => return None,
      Self::SfMax => cycle.sfmax,
      Self::SfMin => cycle.sfmin,
      Self::Saf => cycle.saf,
      Self::Tmin => cycle.tmin,
      Self::Tmax => cycle.tmax,
      Self::R => cycle.r,
      Self::Ndop => cycle.ndop,
      Self::N => cycle.n,
      Self::A => cycle.a
    });
  }
}

impl Display for Column {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return write!(f, "{}", self.header());
  }
}

/// A cell in a sheet.
#[derive(
  Clone, Debug, Serialize, Deserialize, PartialEq, PartialOrd,
  derive_more::From
)]
pub enum SheetCell {
  /// Some text.
  Text(String),
  /// A number.
  Number(f64)
}

impl Display for SheetCell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    return match self {
      Self::Text(s) => s.fmt(f),
      Self::Number(x) => x.fmt(f)
    };
  }
}

/// One cycle type in a sheet.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SheetRow {
  /// The cells, one per column.
  cells: Vec<SheetCell>
}

impl SheetRow {
  /// Lays a cycle out under a label.
  pub fn new(label: String, cycle: &CycleRecord) -> Self {
    let cells = Column::all()
      .iter()
      .map(|col| match col.value(cycle) {
        Some(x) => SheetCell::from(x),
        None => SheetCell::from(label.clone())
      })
      .collect();
    return Self { cells };
  }

  /// The cells.
  pub fn cells(&self) -> &[SheetCell] {
    return &self.cells;
  }

  /// The cell under a column.
  pub fn get(&self, col: Column) -> Option<&SheetCell> {
    return self.cells.get(col.index());
  }

  /// The label in the cycle type column.
  pub fn label(&self) -> Option<&str> {
    return match self.get(Column::CycleType) {
      Some(SheetCell::Text(s)) => Some(s),
      _ => None
    };
  }

  /// The damage in the last column.
  pub fn damage(&self) -> f64 {
    return match self.get(Column::A) {
      Some(SheetCell::Number(x)) => *x,
      _ => 0.0
    };
  }
}

/// The sheet of one node.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Sheet {
  /// The tab name.
  pub name: String,
  /// The node.
  pub node: NodeId,
  /// The node's damage, from the summary report.
  pub damage: f64,
  /// Whether the tab should stand out (the node has failed).
  pub flagged: bool,
  /// The cycle rows, most damaging first.
  pub rows: Vec<SheetRow>
}

impl Sheet {
  /// Creates an empty sheet for a node.
  pub fn new(node: &Node) -> Self {
    return Self {
      name: Self::name_for(node.num()),
      node: node.num(),
      damage: node.damage(),
      flagged: node.has_failed(),
      rows: Vec::new()
    };
  }

  /// The tab name a node's sheet gets.
  pub fn name_for(node: NodeId) -> String {
    return format!("{}n", node);
  }

  /// Whether there are no rows (and hence no header or total either).
  pub fn is_empty(&self) -> bool {
    return self.rows.is_empty();
  }

  /// Sum of the damage of the rows.
  pub fn total_damage(&self) -> f64 {
    return self.rows.iter().map(SheetRow::damage).sum();
  }
}

/// A set of sheets, in the order the nodes were selected.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Workbook {
  /// The sheets.
  pub sheets: Vec<Sheet>
}

impl Workbook {
  /// Looks a sheet up by its node.
  pub fn sheet(&self, node: NodeId) -> Option<&Sheet> {
    return self.sheets.iter().find(|s| s.node == node);
  }

  /// Number of sheets.
  pub fn len(&self) -> usize {
    return self.sheets.len();
  }

  /// Whether there are no sheets.
  pub fn is_empty(&self) -> bool {
    return self.sheets.is_empty();
  }
}
