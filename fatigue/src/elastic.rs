//! This module implements the elastic reduced stress index. The damage report
//! sometimes lumps several moments into a single elastic sample and refers
//! to it by a compacted id; these samples let us find our way back to the
//! moment they came from.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::local::*;
use crate::nodes::*;
use crate::scanner::*;
use crate::util::*;

/// What an elastic sample needs in order to find the moment it came from.
#[derive(Copy, Clone, Debug)]
pub struct Resolution<'a> {
  /// The local stresses of the sample's node.
  pub local: &'a LocalStressTable,
  /// The node's governing component.
  pub component: Component
}

/// One elastic reduced stress sample.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElasticStressSample {
  /// The sample's id within the node.
  id: usize,
  /// The temperature.
  temperature: f64,
  /// Elastic limit at this temperature.
  rpe: f64,
  /// Second material parameter of the yield model.
  nu: f64,
  /// Reduced stress, as linearised (matches the local tables).
  sll: f64,
  /// Fictitious elastic stress (matches the damage report).
  sfl: f64,
  /// The moment this sample was found to come from. Written once, on the
  /// first successful resolution, and never again.
  #[serde(skip)]
  real_id: OnceCell<MomentId>
}

impl ElasticStressSample {
  /// Creates a sample.
  pub fn new(
    id: usize,
    temperature: f64,
    rpe: f64,
    nu: f64,
    sll: f64,
    sfl: f64
  ) -> Self {
    return Self {
      id,
      temperature,
      rpe,
      nu,
      sll,
      sfl,
      real_id: OnceCell::new()
    };
  }

  /// The sample's id.
  pub fn id(&self) -> usize {
    return self.id;
  }

  /// The temperature.
  pub fn temperature(&self) -> f64 {
    return self.temperature;
  }

  /// Elastic limit.
  pub fn rpe(&self) -> f64 {
    return self.rpe;
  }

  /// Second yield parameter.
  pub fn nu(&self) -> f64 {
    return self.nu;
  }

  /// Linearised reduced stress.
  pub fn sll(&self) -> f64 {
    return self.sll;
  }

  /// Fictitious elastic stress.
  pub fn sfl(&self) -> f64 {
    return self.sfl;
  }

  /// The cached moment, if a resolution already succeeded.
  pub fn cached_real_id(&self) -> Option<MomentId> {
    return self.real_id.get().copied();
  }

  /// Finds the moment this sample came from: the first local sample with
  /// the same temperature and whose selected reduced stress equals `sll`.
  ///
  /// Once found, the moment is kept for good and returned on every later
  /// call regardless of the resolution passed in. Misses aren't cached.
  pub fn real_id(&self, res: &Resolution) -> Option<MomentId> {
    if let Some(id) = self.real_id.get() {
      return Some(*id);
    }
    let found = res.local.iter()
      .find(|s| {
        is_close(self.temperature, s.temperature(), TEMPERATURE_TOLERANCE)
          && is_close(self.sll, s.reduced(res.component), STRESS_TOLERANCE)
      })?
      .moment();
    return Some(*self.real_id.get_or_init(|| found));
  }
}

/// The elastic samples of one node, in report order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElasticStressTable {
  /// The node.
  node: NodeId,
  /// The samples.
  samples: Vec<ElasticStressSample>
}

impl ElasticStressTable {
  /// Creates an empty table for a node.
  pub fn new(node: NodeId) -> Self {
    return Self { node, samples: Vec::new() };
  }

  /// The node this table belongs to.
  pub fn node(&self) -> NodeId {
    return self.node;
  }

  /// Appends a sample and returns it.
  pub fn add(&mut self, sample: ElasticStressSample) -> &ElasticStressSample {
    self.samples.push(sample);
    return &self.samples[self.samples.len() - 1];
  }

  /// Number of samples.
  pub fn len(&self) -> usize {
    return self.samples.len();
  }

  /// Whether the table has no samples.
  pub fn is_empty(&self) -> bool {
    return self.samples.is_empty();
  }

  /// Iterates over the samples.
  pub fn iter(&self) -> impl Iterator<Item = &ElasticStressSample> {
    return self.samples.iter();
  }

  /// Takes the first sample whose `sfl` equals a stress and returns the
  /// moment it came from. Later samples are not tried if that one doesn't
  /// resolve.
  pub fn search_by_stress(
    &self,
    stress: f64,
    res: &Resolution
  ) -> Option<MomentId> {
    return self.samples.iter()
      .find(|s| is_close(s.sfl, stress, STRESS_TOLERANCE))?
      .real_id(res);
  }
}

/// Layout of the elastic reduced stress report.
pub struct ElasticStressLayout;

impl BlockLayout for ElasticStressLayout {
  type Record = ElasticStressSample;
  const NAME: &'static str = "elastic reduced stress";
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
    if fields.len() < 4 {
      return None;
    }
    return Some(ElasticStressSample::new(
      nth_natural(fields, 0)?,
      nth_real(fields, 1)?,
      nth_real(fields, 2)?,
      nth_real(fields, 3)?,
      nth_last_real(fields, 3)?,
      nth_last_real(fields, 1)?
    ));
  }
}

/// The elastic stress tables of every matched node.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ElasticStressIndex {
  /// The tables.
  tables: BTreeMap<NodeId, ElasticStressTable>
}

impl ElasticStressIndex {
  /// Creates an empty index.
  pub fn new() -> Self {
    return Self::default();
  }

  /// Adds a whole table, replacing any previous one for the same node.
  pub fn add_table(&mut self, table: ElasticStressTable) -> &ElasticStressTable {
    let node = table.node;
    self.tables.insert(node, table);
    return &self.tables[&node];
  }

  /// The table of a node, if it was matched.
  pub fn get(&self, node: NodeId) -> Option<&ElasticStressTable> {
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
  pub fn iter(&self) -> impl Iterator<Item = &ElasticStressTable> {
    return self.tables.values();
  }

  /// Scans an elastic reduced stress report from a BufRead instance.
  pub fn parse_bufread<R: BufRead>(
    reader: R,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut index = Self::new();
    scan_bufread::<ElasticStressLayout, _, _>(reader, registry, &mut index)?;
    return Ok(index);
  }

  /// Utility method -- reads and scans an elastic reduced stress report file.
  pub fn parse_file<P: AsRef<Path>>(
    path: P,
    registry: &NodeRegistry
  ) -> io::Result<Self> {
    let mut index = Self::new();
    scan_file::<ElasticStressLayout, _, _>(path, registry, &mut index)?;
    return Ok(index);
  }
}

impl BlockSink<ElasticStressSample> for ElasticStressIndex {
  fn open(&mut self, gate: &Gate) {
    self.tables
      .entry(gate.node)
      .or_insert_with(|| ElasticStressTable::new(gate.node));
  }

  fn push(&mut self, node: NodeId, record: ElasticStressSample) {
    self.tables
      .entry(node)
      .or_insert_with(|| ElasticStressTable::new(node))
      .add(record);
  }

  fn close(&mut self, _node: NodeId) {}
}
