//! This module implements the cycle classifier: for each node, the fatigue
//! cycle types listed in the accumulated fatigue damage report, most
//! damaging first.

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::nodes::*;
use crate::scanner::*;
use crate::util::*;

/// One classified cycle type.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
  /// First endpoint: a moment, or a compacted id.
  pub first_id: usize,
  /// Second endpoint: a moment, or a compacted id.
  pub second_id: usize,
  /// Stress amplitude.
  pub saf: f64,
  /// Maximum stress.
  pub sfmax: f64,
  /// Minimum stress.
  pub sfmin: f64,
  /// Temperature at the maximum.
  pub tmax: f64,
  /// Temperature at the minimum.
  pub tmin: f64,
  /// Stress ratio.
  pub r: f64,
  /// Allowable number of cycles.
  pub ndop: f64,
  /// Applied number of cycles.
  pub n: f64,
  /// Damage contributed by these cycles.
  pub a: f64
}

impl CycleRecord {
  /// Whether either endpoint is above a local table length, i.e. it is not a
  /// moment but a compacted id.
  pub fn is_compacted(&self, table_length: usize) -> bool {
    return self.first_id > table_length || self.second_id > table_length;
  }
}

/// The cycles of one node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleTable {
  /// The node.
  node: NodeId,
  /// The cycles.
  cycles: Vec<CycleRecord>
}

impl CycleTable {
  /// Creates an empty table for a node.
  pub fn new(node: NodeId) -> Self {
    return Self { node, cycles: Vec::new() };
  }

  /// The node this table belongs to.
  pub fn node(&self) -> NodeId {
    return self.node;
  }

  /// Appends a cycle and returns it.
  pub fn add(&mut self, cycle: CycleRecord) -> &CycleRecord {
    self.cycles.push(cycle);
    return &self.cycles[self.cycles.len() - 1];
  }

  /// Sorts the cycles from most to least damaging. Equal damages keep their
  /// report order.
  pub fn sort_by_damage(&mut self) {
    self.cycles.sort_by(|x, y| y.a.total_cmp(&x.a));
  }

  /// Number of cycles.
  pub fn len(&self) -> usize {
    return self.cycles.len();
  }

  /// Whether the table has no cycles.
  pub fn is_empty(&self) -> bool {
    return self.cycles.is_empty();
  }

  /// Iterates over the cycles.
  pub fn iter(&self) -> impl Iterator<Item = &CycleRecord> {
    return self.cycles.iter();
  }

  /// Iterates over the cycles whose damage is above a limit.
  pub fn above(&self, limit: f64) -> impl Iterator<Item = &CycleRecord> {
    return self.cycles.iter().filter(move |c| c.a > limit);
  }

  /// Sum of the damage of every cycle.
  pub fn total_damage(&self) -> f64 {
    return self.cycles.iter().map(|c| c.a).sum();
  }
}

/// Layout of the accumulated fatigue damage report.
pub struct CycleLayout;

impl BlockLayout for CycleLayout {
  type Record = CycleRecord;
  const NAME: &'static str = "accumulated fatigue damage";
  const NODE_HEADERS: &'static [HeaderPattern] = &[
    HeaderPattern::new("> Calculation node")
  ];
  const COMPONENT_HEADERS: &'static [HeaderPattern] = &[
    HeaderPattern::new("> Component number")
  ];
  const MOMENT_HEADERS: &'static [HeaderPattern] = &[
    HeaderPattern::new("> Base calculated moment of time")
  ];
  const LABEL_LINES: usize = 2;

  fn decode(fields: &[&str]) -> Option<Self::Record> {
    return Some(CycleRecord {
      first_id: nth_natural(fields, 0)?,
      second_id: nth_natural(fields, 2)?,
      sfmax: nth_real(fields, 5)?,
      sfmin: nth_real(fields, 6)?,
      saf: nth_real(fields, 7)?,
      tmin: nth_real(fields, 8)?,
      tmax: nth_real(fields, 9)?,
      r: nth_real(fields, 10)?,
      ndop: nth_real(fields, 19)?,
      n: nth_real(fields, 20)?,
      a: nth_real(fields, 21)?
    });
  }
}

/// The cycle tables of every matched node.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CycleClassifier {
  /// The tables.
  tables: BTreeMap<NodeId, CycleTable>
}

impl CycleClassifier {
  /// Creates an empty classifier.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Adds a whole table, sorting it and replacing any previous one for the
  /// same node.
  pub fn add_table(&mut self, mut table: CycleTable) -> &CycleTable {
    let node = table.node;
    table.sort_by_damage();
    self.tables.insert(node, table);
    return &self.tables[&node];
  }

  /// The table of a node, if it was matched.
  pub fn get(&self, node: NodeId) -> Option<&CycleTable> {
    return self.tables.get(&node);
  }

  /// Number of tables.
  pub fn len(&self) -> usize {
    return self.tables.len();
  }

  /// Whether there are no tables.
  pub fn is_empty(&self) -> bool {
    return self.tables.is_empty();
  }

  /// Iterates over the tables, in node order.
  pub fn iter(&self) -> impl Iterator<Item = &CycleTable> {
    return self.tables.values();
  }

  /// Scans an accumulated fatigue damage report from a BufRead instance.
  pub fn parse_bufread<R: BufRead>(
    reader: R,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut classifier = Self::new();
    scan_bufread::<CycleLayout, _, _>(reader, registry, &mut classifier)?;
    return Ok(classifier);
  }

  /// Utility method -- reads and scans a damage report file.
  pub fn parse_file<P: AsRef<Path>>(
    path: P,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut classifier = Self::new();
    scan_file::<CycleLayout, _, _>(path, registry, &mut classifier)?;
    return Ok(classifier);
  }
}

impl BlockSink<CycleRecord> for CycleClassifier {
  fn open(&mut self, gate: &Gate) {
    self.tables
      .entry(gate.node)
      .or_insert_with(|| CycleTable::new(gate.node));
  }

  fn push(&mut self, node: NodeId, record: CycleRecord) {
    self.tables
      .entry(node)
      .or_insert_with(|| CycleTable::new(node))
      .add(record);
  }

  fn close(&mut self, node: NodeId) {
    if let Some(table) = self.tables.get_mut(&node) {
      table.sort_by_damage();
    }
  }
}
