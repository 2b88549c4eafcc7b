//! This module implements the local reduced stress index: for each node, the
//! time series of temperatures and principal local stresses at its base
//! moment.

use std::cell::OnceCell;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::nodes::*;
use crate::scanner::*;
use crate::util::*;

/// A moment of time, as numbered by the reports.
pub type MomentId = usize;

/// The stresses of a node at one moment of time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalStressSample {
  /// The moment.
  moment: MomentId,
  /// The temperature.
  temperature: f64,
  /// First principal local stress.
  si: f64,
  /// Second principal local stress.
  sj: f64,
  /// Third principal local stress.
  sk: f64,
  /// Cached [sij, sjk, sik]. Computed once, on first access.
  #[serde(skip)]
  differences: OnceCell<[f64; 3]>
}

impl LocalStressSample {
  /// Creates a sample.
  pub fn new(
    moment: MomentId,
    temperature: f64,
    si: f64,
    sj: f64,
    sk: f64
  ) -> Self {
    return Self {
      moment,
      temperature,
      si,
      sj,
      sk,
      differences: OnceCell::new()
    };
  }

  /// The moment this sample belongs to.
  pub fn moment(&self) -> MomentId {
    return self.moment;
  }

  /// The temperature.
  pub fn temperature(&self) -> f64 {
    return self.temperature;
  }

  /// First principal local stress.
  pub fn si(&self) -> f64 {
    return self.si;
  }

  /// Second principal local stress.
  pub fn sj(&self) -> f64 {
    return self.sj;
  }

  /// Third principal local stress.
  pub fn sk(&self) -> f64 {
    return self.sk;
  }

  /// The three stress differences. Frozen at first access.
  fn differences(&self) -> &[f64; 3] {
    return self.differences.get_or_init(|| {
      [self.si - self.sj, self.sj - self.sk, self.si - self.sk]
    });
  }

  /// si - sj.
  pub fn sij(&self) -> f64 {
    return self.differences()[0];
  }

  /// sj - sk.
  pub fn sjk(&self) -> f64 {
    return self.differences()[1];
  }

  /// si - sk.
  pub fn sik(&self) -> f64 {
    return self.differences()[2];
  }

  /// The reduced stress a component selects.
  pub fn reduced(&self, component: Component) -> f64 {
    return match component {
      Component::Ij => self.sij(),
      Component::Jk => self.sjk(),
      Component::Ik => self.sik()
    };
  }
}

/// The local stress samples of one node, by moment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalStressTable {
  /// The node.
  node: NodeId,
  /// The samples.
  samples: BTreeMap<MomentId, LocalStressSample>
}

impl LocalStressTable {
  /// Creates an empty table for a node.
  pub fn new(node: NodeId) -> Self {
    return Self { node, samples: BTreeMap::new() };
  }

  /// The node this table belongs to.
  pub fn node(&self) -> NodeId {
    return self.node;
  }

  /// Adds a sample and returns it. A repeated moment replaces the old one.
  pub fn add(&mut self, sample: LocalStressSample) -> &LocalStressSample {
    return match self.samples.entry(sample.moment) {
      Entry::Vacant(v) => v.insert(sample),
      Entry::Occupied(mut o) => {
        warn!(
          "Node {} has moment {} twice in its local stresses, keeping the last.",
          self.node,
          sample.moment
        );
        o.insert(sample);
        o.into_mut()
      }
    };
  }

  /// Looks a moment up.
  pub fn get(&self, moment: MomentId) -> Option<&LocalStressSample> {
    return self.samples.get(&moment);
  }

  /// Number of samples.
  pub fn len(&self) -> usize {
    return self.samples.len();
  }

  /// Whether the table has no samples.
  pub fn is_empty(&self) -> bool {
    return self.samples.is_empty();
  }

  /// Iterates over the samples, in ascending moment order.
  pub fn iter(&self) -> impl Iterator<Item = &LocalStressSample> {
    return self.samples.values();
  }
}

/// Layout of the local reduced stress report.
pub struct LocalStressLayout;

impl BlockLayout for LocalStressLayout {
  type Record = LocalStressSample;
  const NAME: &'static str = "local reduced stress";
  const NODE_HEADERS: &'static [HeaderPattern] = &[
    HeaderPattern::new("> Calculation node")
  ];
  const COMPONENT_HEADERS: &'static [HeaderPattern] = &[];
  const MOMENT_HEADERS: &'static [HeaderPattern] = &[
    HeaderPattern::with_trailer(">>moment", "-> calculation results Table")
  ];
  const LABEL_LINES: usize = 1;

  fn decode(fields: &[&str]) -> Option<Self::Record> {
    return Some(LocalStressSample::new(
      nth_natural(fields, 0)?,
      nth_real(fields, 1)?,
      nth_real(fields, 5)?,
      nth_real(fields, 6)?,
      nth_real(fields, 7)?
    ));
  }
}

/// The local stress tables of every matched node.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LocalStressIndex {
  /// The tables.
  tables: BTreeMap<NodeId, LocalStressTable>
}

impl LocalStressIndex {
  /// Creates an empty index.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Adds a whole table, replacing any previous one for the same node.
  pub fn add_table(&mut self, table: LocalStressTable) -> &LocalStressTable {
    let node = table.node;
    self.tables.insert(node, table);
    return &self.tables[&node];
  }

  /// The table of a node, if it was matched.
  pub fn get(&self, node: NodeId) -> Option<&LocalStressTable> {
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
  pub fn iter(&self) -> impl Iterator<Item = &LocalStressTable> {
    return self.tables.values();
  }

  /// The largest number of samples recorded for any node. Cycle endpoints
  /// above this can't be moments and refer to lumped elastic samples.
  pub fn table_length(&self) -> usize {
    return self.tables.values().map(|t| t.len()).max().unwrap_or(0);
  }

  /// Scans a local reduced stress report from a BufRead instance.
  pub fn parse_bufread<R: BufRead>(
    reader: R,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut index = Self::new();
    scan_bufread::<LocalStressLayout, _, _>(reader, registry, &mut index)?;
    return Ok(index);
  }

  /// Utility method -- reads and scans a local reduced stress report file.
  pub fn parse_file<P: AsRef<Path>>(
    path: P,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut index = Self::new();
    scan_file::<LocalStressLayout, _, _>(path, registry, &mut index)?;
    return Ok(index);
  }
}

impl BlockSink<LocalStressSample> for LocalStressIndex {
  fn open(&mut self, gate: &Gate) {
    self.tables
      .entry(gate.node)
      .or_insert_with(|| LocalStressTable::new(gate.node));
  }

  fn push(&mut self, node: NodeId, record: LocalStressSample) {
    self.tables
      .entry(node)
      .or_insert_with(|| LocalStressTable::new(node))
      .add(record);
  }

  fn close(&mut self, _node: NodeId) {}
}
